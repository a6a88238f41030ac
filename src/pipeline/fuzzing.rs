use std::collections::BTreeSet;
use std::net::IpAddr;
use std::path::Path;

use super::{DomainJob, Stage, StagePipeline, StageResult, Staged, TargetFold};
use crate::dedup::{ffuf, fuzz_targets, new_vhost_subdomains};
use crate::error::{ReconError, Result};
use crate::external::{tools, ToolCommand};
use crate::output::artifact_store::Artifact;

/// Drop a CSV left in `raw/` by an earlier run so it cannot pass for this
/// run's matches.
async fn clear_stale_output(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// ffuf leaves no file behind when nothing matched.
async fn read_ffuf_output(path: &Path) -> std::io::Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}

fn require_wordlist(stage: Stage, path: &str, key: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(ReconError::Config(format!("{} needs paths.{} to be set", stage, key)));
    }
    Ok(())
}

impl StagePipeline {
    /// Run ffuf and return its CSV output.
    async fn run_ffuf(&self, cmd: &ToolCommand, csv_path: &Path) -> Result<String> {
        clear_stale_output(csv_path).await.map_err(|e| ReconError::invocation("ffuf", e))?;
        self.invoker.run(cmd).await?;
        read_ffuf_output(csv_path).await.map_err(|e| ReconError::invocation("ffuf", e))
    }

    /// Host-header fuzzing against each non-CDN IP, diffed against the
    /// known active subdomains.
    pub(crate) async fn vhost_discovery(
        &self,
        job: &mut DomainJob,
        active: &[String],
        ips: &[IpAddr],
    ) -> Result<Staged<()>> {
        let stage = Stage::VhostDiscovery;
        let wordlist = &self.options.config.paths.subdomains;
        require_wordlist(stage, wordlist, "subdomains")?;
        println!("[*] Virtual host discovery for {} on {} IPs...", job.domain, ips.len());

        let mut fold = TargetFold::new(stage);
        for ip in ips {
            let ip = ip.to_string();
            let csv_path = job.store.scratch_path(stage, &format!("vhost_{}.csv", ip.replace(':', "_"))).await?;
            let cmd = tools::ffuf_vhost(wordlist, &ip, &job.domain, &csv_path);
            let domain = job.domain.clone();
            let outcome = self.run_ffuf(&cmd, &csv_path).await.map(|csv| {
                ffuf::csv_matches(&csv).into_iter().map(|w| format!("{}.{}", w, domain)).collect::<Vec<_>>()
            });
            fold.record(&ip, outcome);
        }
        let hosts: BTreeSet<String> = job.absorb(fold).into_iter().flatten().collect();
        let hosts: Vec<String> = hosts.into_iter().collect();

        let mut produced = vec![job.store.write_lines(stage, Artifact::Vhost, &hosts).await?];
        let new_subs = new_vhost_subdomains(active, &hosts.join("\n"), &job.domain);
        if !new_subs.is_empty() {
            produced.push(job.store.write_lines(stage, Artifact::NewVhostSubdomains, &new_subs).await?);
            println!("[+] New subdomains found: {}", new_subs.join(", "));
        }
        Ok(Staged::new((), StageResult::ok(stage, produced).with_discovered(new_subs)))
    }

    /// Path fuzzing on subdomains that answered with a client error.
    pub(crate) async fn smart_fuzz(&self, job: &mut DomainJob, forbidden: &[String]) -> Result<Staged<()>> {
        let stage = Stage::SmartFuzz;
        let wordlist = &self.options.config.paths.backup_login;
        require_wordlist(stage, wordlist, "backup_login")?;
        println!("[*] Smart fuzzing on {} 4xx subdomains...", forbidden.len());

        let mut produced = vec![job.store.append(stage, Artifact::SmartFuzzing, b"").await?];
        let mut fold = TargetFold::new(stage);
        for sub in forbidden {
            let csv_path = job.store.scratch_path(stage, &format!("smart_{}.csv", sub)).await?;
            let cmd = tools::ffuf_smart(wordlist, sub, &csv_path);
            match self.run_ffuf(&cmd, &csv_path).await {
                Ok(raw) => {
                    job.store.append(stage, Artifact::SmartFuzzing, raw.as_bytes()).await?;
                    fold.record(sub, Ok::<_, ReconError>(ffuf::extract_urls(&raw, sub)));
                }
                Err(e) => fold.skip(sub, e),
            }
        }
        let hits: Vec<String> = job.absorb(fold).into_iter().flatten().collect();

        if !hits.is_empty() {
            produced.push(job.store.write_lines(stage, Artifact::SmartFuzzing200, &hits).await?);
            println!("[+] Found accessible paths: {}", hits.len());
        }
        Ok(Staged::new((), StageResult::ok(stage, produced).with_discovered(hits)))
    }

    /// Fuzz the directories JS files live in for unlinked siblings.
    pub(crate) async fn js_fuzz(&self, job: &mut DomainJob, js_urls: &[String]) -> Result<Staged<()>> {
        let stage = Stage::JsFuzz;
        let wordlist = &self.options.config.paths.js_smart_fuzzing;
        require_wordlist(stage, wordlist, "js_smart_fuzzing")?;

        let targets = fuzz_targets(js_urls.iter().map(String::as_str));
        println!("[*] JS fuzzing {} directories...", targets.len());

        let mut fold = TargetFold::new(stage);
        for (idx, target) in targets.iter().enumerate() {
            let csv_path = job.store.scratch_path(stage, &format!("jsfuzz_{}.csv", idx)).await?;
            let cmd = tools::ffuf_js(wordlist, &target.fuzz_url(), &csv_path);
            let outcome = self.run_ffuf(&cmd, &csv_path).await.map(|csv| {
                ffuf::csv_matches(&csv).iter().map(|name| target.candidate(name)).collect::<Vec<_>>()
            });
            fold.record(&target.fuzz_url(), outcome);
        }
        let known: BTreeSet<&str> = js_urls.iter().map(String::as_str).collect();
        let found: BTreeSet<String> = job.absorb(fold).into_iter().flatten().collect();
        let new_files: Vec<String> = found.into_iter().filter(|u| !known.contains(u.as_str())).collect();

        let mut produced = Vec::new();
        if new_files.is_empty() {
            println!("[*] JS fuzzing completed. No new JS files found.");
        } else {
            produced.push(job.store.write_lines(stage, Artifact::NewJsFiles, &new_files).await?);
            println!("[+] JS fuzzing completed. {} new JS files found", new_files.len());
        }
        Ok(Staged::new((), StageResult::ok(stage, produced).with_discovered(new_files)))
    }
}
