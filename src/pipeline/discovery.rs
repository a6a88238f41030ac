use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::net::IpAddr;

use super::{DomainJob, Stage, StagePipeline, StageResult, Staged, TargetFold};
use crate::error::{ReconError, Result};
use crate::external::tools;
use crate::filter::merge_unique;
use crate::output::artifact_store::Artifact;

/// An active subdomain and the addresses it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    pub host: String,
    pub ips: Vec<IpAddr>,
}

impl StagePipeline {
    /// Union of every enumerator's output. Individual tool failures are
    /// tolerated; the stage fails only when none of them ran.
    pub(crate) async fn enumerate(&self, job: &mut DomainJob) -> Result<Staged<Vec<String>>> {
        let stage = Stage::Enumerate;
        println!("[*] Subdomain discovery for {}...", job.domain);

        let mut fold = TargetFold::new(stage);
        for cmd in tools::enumerators(&job.domain) {
            let out = self.invoker.run(&cmd).await;
            fold.record(&cmd.program, out.map(|b| String::from_utf8_lossy(&b).into_owned()));
        }
        if fold.succeeded.is_empty() {
            let reasons: Vec<String> = fold.skipped.iter().map(|s| s.reason.clone()).collect();
            return Err(ReconError::stage_io(stage.name(), format!("all enumerators failed: {}", reasons.join("; "))));
        }
        let outputs = job.absorb(fold);
        let subdomains = merge_unique(outputs.iter().map(String::as_str));

        let r = job.store.write_lines(stage, Artifact::Subdomains, &subdomains).await?;
        println!("[+] {}: {} subdomains", job.domain, subdomains.len());
        Ok(Staged::new(subdomains, StageResult::ok(stage, vec![r])))
    }

    /// Keep subdomains that resolve to at least one address.
    pub(crate) async fn filter_active(&self, job: &mut DomainJob, subdomains: &[String]) -> Result<Staged<Vec<ResolvedHost>>> {
        let stage = Stage::FilterActive;
        println!("[*] Filtering active subdomains...");

        let probe = &self.probe;
        let mut active: Vec<ResolvedHost> = stream::iter(subdomains.iter().cloned())
            .map(|host| async move {
                let ips = probe.resolve(&host).await;
                ResolvedHost { host, ips }
            })
            .buffer_unordered(self.options.config.settings.probe_concurrency)
            .filter(|h| futures::future::ready(!h.ips.is_empty()))
            .collect()
            .await;
        active.sort_by(|a, b| a.host.cmp(&b.host));

        let names: Vec<String> = active.iter().map(|h| h.host.clone()).collect();
        let r = job.store.write_lines(stage, Artifact::ActiveSubdomains, &names).await?;
        println!("[+] {}: {}/{} subdomains active", job.domain, active.len(), subdomains.len());
        Ok(Staged::new(active, StageResult::ok(stage, vec![r])))
    }

    /// Persist `<subdomain> <ip>` pairs from the liveness lookups.
    pub(crate) async fn resolve_ips(&self, job: &mut DomainJob, active: &[ResolvedHost]) -> Result<Staged<()>> {
        let stage = Stage::ResolveIps;
        let lines: Vec<String> = active
            .iter()
            .flat_map(|h| h.ips.iter().map(move |ip| format!("{} {}", h.host, ip)))
            .collect();
        let r = job.store.write_lines(stage, Artifact::Ips, &lines).await?;
        Ok(Staged::new((), StageResult::ok(stage, vec![r])))
    }

    pub(crate) async fn classify_non_cdn(&self, job: &mut DomainJob, active: &[ResolvedHost]) -> Result<Staged<Vec<IpAddr>>> {
        let stage = Stage::ClassifyNonCdn;
        let unique: BTreeSet<IpAddr> = active.iter().flat_map(|h| h.ips.iter().copied()).collect();
        let mut non_cdn = Vec::new();
        for ip in unique {
            match self.cdn.provider(&ip) {
                Some(provider) => tracing::debug!(%ip, provider, "cdn address"),
                None => non_cdn.push(ip),
            }
        }

        let lines: Vec<String> = non_cdn.iter().map(IpAddr::to_string).collect();
        let r = job.store.write_lines(stage, Artifact::NonCdnIps, &lines).await?;
        println!("[*] Found {} non-CDN IPs", non_cdn.len());
        Ok(Staged::new(non_cdn, StageResult::ok(stage, vec![r])))
    }

    /// Subdomains whose root answers with a client-error status.
    pub(crate) async fn forbidden_check(&self, job: &mut DomainJob, active: &[String]) -> Result<Staged<Vec<String>>> {
        let stage = Stage::ForbiddenCheck;
        println!("[*] Checking subdomains for 4xx status...");

        let probe = &self.probe;
        let mut forbidden: Vec<String> = stream::iter(active.iter().cloned())
            .map(|host| async move {
                let status = probe.status(&host).await;
                (host, status)
            })
            .buffer_unordered(self.options.config.settings.probe_concurrency)
            .filter_map(|(host, status)| async move {
                match status {
                    Some(code) if (400..500).contains(&code) => Some(host),
                    _ => None,
                }
            })
            .collect()
            .await;
        forbidden.sort();

        let r = job.store.write_lines(stage, Artifact::ForbiddenSubdomains, &forbidden).await?;
        Ok(Staged::new(forbidden, StageResult::ok(stage, vec![r])))
    }
}
