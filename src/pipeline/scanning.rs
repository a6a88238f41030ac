use futures::stream::{self, StreamExt};

use super::{DomainJob, Stage, StagePipeline, StageResult, Staged, TargetFold};
use crate::analyze::cache_headers::WcdResult;
use crate::dedup::scan_targets;
use crate::error::{ReconError, Result};
use crate::external::tools;
use crate::output::artifact_store::Artifact;

impl StagePipeline {
    /// One sqlmap run per canonical `base?firstParam` target.
    pub(crate) async fn sqli_scan(&self, job: &mut DomainJob, candidates: &[String]) -> Result<Staged<()>> {
        let stage = Stage::SqliScan;
        let targets = scan_targets(candidates.iter().map(String::as_str));
        println!("[*] SQLi scan: {} candidates -> {} unique targets", candidates.len(), targets.len());

        let r = job.store.append(stage, Artifact::SqliResults, b"").await?;
        let mut fold = TargetFold::new(stage);
        for target in &targets {
            match self.invoker.run(&tools::sqlmap(target)).await {
                Ok(out) => {
                    job.store.append(stage, Artifact::SqliResults, &out).await?;
                    fold.record(target, Ok::<_, ReconError>(()));
                }
                Err(e) => fold.skip(target, e),
            }
        }
        job.absorb(fold);
        Ok(Staged::new((), StageResult::ok(stage, vec![r])))
    }

    pub(crate) async fn nuclei_scan(&self, job: &mut DomainJob) -> Result<Staged<()>> {
        let stage = Stage::NucleiScan;
        println!("[*] Nuclei scan for {}...", job.domain);

        let list = job.store.path(Artifact::ActiveSubdomains);
        let out = self.invoker.run(&tools::nuclei(&list, &self.options.config.paths.nuclei_templates)).await?;
        let r = job.store.write_bytes(stage, Artifact::NucleiResults, &out).await?;
        Ok(Staged::new((), StageResult::ok(stage, vec![r])))
    }

    /// HEAD every static asset and flag the ones that look cacheable. The full
    /// result set is persisted; only cached URLs go to the report.
    pub(crate) async fn web_cache_deception(&self, job: &mut DomainJob, static_urls: &[String]) -> Result<Staged<()>> {
        let stage = Stage::WebCacheDeception;
        println!("[*] Web cache deception check on {} static files...", static_urls.len());

        let probe = &self.probe;
        let mut outcomes: Vec<(String, Result<WcdResult>)> = stream::iter(static_urls.iter().cloned())
            .map(|url| async move {
                let outcome = probe.head(&url).await.map(|headers| WcdResult::analyze(&url, headers));
                (url, outcome)
            })
            .buffer_unordered(self.options.config.settings.probe_concurrency)
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut fold = TargetFold::new(stage);
        for (url, outcome) in outcomes {
            fold.record(&url, outcome);
        }
        let results = job.absorb(fold);
        let r = job.store.write_json(stage, Artifact::WcdResults, &results).await?;

        let cached: Vec<String> = results.iter().filter(|w| w.cached).map(|w| w.url.clone()).collect();
        if cached.is_empty() {
            println!("[*] Web cache deception check completed. No cached files found.");
        } else {
            println!(
                "[+] Found {} potentially cached files. Check {} for details.",
                cached.len(),
                job.store.path(Artifact::WcdResults).display()
            );
        }
        Ok(Staged::new((), StageResult::ok(stage, vec![r]).with_discovered(cached)))
    }
}
