//! Per-domain staged recon pipeline.
//!
//! Stages run strictly in order; each one receives the in-process output of
//! the stages before it and persists its own artifacts through the domain's
//! `ArtifactStore`. Load-bearing stages abort the domain on failure, flag-gated
//! stages only log.

pub mod content;
pub mod discovery;
pub mod fuzzing;
pub mod scanning;
pub mod stage;

use std::sync::Arc;

use crate::error::{ReconError, Result};
use crate::external::ToolInvoker;
use crate::options::Options;
use crate::output::artifact_store::ArtifactStore;
use crate::output::report::{DomainReport, DomainStatus, ReportEmitter};
use crate::probe::{CdnRanges, NetworkProbe};

pub use stage::{SkippedTarget, Stage, StageResult, Staged, TargetFold};

/// State owned by one domain's run.
#[derive(Debug)]
pub struct DomainJob {
    pub domain: String,
    pub store: ArtifactStore,
    pub results: Vec<StageResult>,
    pub skipped: Vec<SkippedTarget>,
}

impl DomainJob {
    pub fn new(domain: &str, store: ArtifactStore) -> Self {
        Self { domain: domain.to_string(), store, results: Vec::new(), skipped: Vec::new() }
    }

    /// Record a finished stage and hand back its value.
    fn record<T>(&mut self, staged: Staged<T>) -> T {
        let r = &staged.result;
        tracing::info!(
            domain = %self.domain,
            stage = %r.stage,
            produced = r.produced.len(),
            discovered = r.discovered.len(),
            "stage finished"
        );
        self.results.push(staged.result);
        staged.value
    }

    fn absorb<T>(&mut self, fold: TargetFold<T>) -> Vec<T> {
        self.skipped.extend(fold.skipped);
        fold.succeeded
    }

    /// Failures of non-optional stages end the domain's run.
    fn require<T>(&mut self, stage: Stage, outcome: Result<Staged<T>>) -> Result<T> {
        debug_assert!(!stage.is_optional(), "{} is flag-gated", stage);
        match outcome {
            Ok(staged) => Ok(self.record(staged)),
            Err(e) => {
                if stage.is_load_bearing() && !matches!(e, ReconError::EmptyResult { .. }) {
                    tracing::error!(domain = %self.domain, stage = %stage, error = %e, "load-bearing stage failed");
                }
                self.results.push(StageResult::failed(stage));
                Err(e)
            }
        }
    }

    /// Optional stage failures are logged and recorded, never propagated.
    fn optional<T>(&mut self, stage: Stage, outcome: Result<Staged<T>>) -> Option<T> {
        debug_assert!(stage.is_optional(), "{} is not flag-gated", stage);
        match outcome {
            Ok(staged) => Some(self.record(staged)),
            Err(e) => {
                tracing::warn!(domain = %self.domain, stage = %stage, error = %e, "optional stage failed");
                eprintln!("[!] {} ({}): {}", self.domain, stage, e);
                self.results.push(StageResult::failed(stage));
                None
            }
        }
    }

    pub fn discovered(&self, stage: Stage) -> Vec<String> {
        self.results.iter().filter(|r| r.stage == stage).flat_map(|r| r.discovered.iter().cloned()).collect()
    }
}

/// Runs every stage for one domain against shared, read-only collaborators.
#[derive(Clone)]
pub struct StagePipeline {
    options: Arc<Options>,
    invoker: Arc<dyn ToolInvoker>,
    probe: Arc<dyn NetworkProbe>,
    cdn: CdnRanges,
}

impl StagePipeline {
    pub fn new(options: Arc<Options>, invoker: Arc<dyn ToolInvoker>, probe: Arc<dyn NetworkProbe>) -> Self {
        let cdn = CdnRanges::with_extra(&options.config.cdn_ranges);
        Self { options, invoker, probe, cdn }
    }

    /// Run the pipeline for `domain`. Returns the domain report unless a
    /// load-bearing stage failed.
    pub async fn run(&self, domain: &str) -> Result<DomainReport> {
        let store = ArtifactStore::create(self.options.domain_dir(domain), domain).await?;
        let mut job = DomainJob::new(domain, store);
        println!("[*] Starting recon for {}", domain);

        let status = match self.run_stages(&mut job).await {
            Ok(()) => DomainStatus::Completed,
            Err(ReconError::EmptyResult { stage }) => {
                println!("[*] {}: no records after {}, stopping early", domain, stage);
                DomainStatus::Empty(stage)
            }
            Err(e) => {
                tracing::error!(domain, error = %e, "pipeline aborted");
                return Err(e);
            }
        };

        let report = ReportEmitter::emit(&mut job, status).await?;
        println!("[*] Finished processing {}", domain);
        Ok(report)
    }

    async fn run_stages(&self, job: &mut DomainJob) -> Result<()> {
        let features = self.options.features;

        let outcome = self.enumerate(job).await;
        let subdomains = job.require(Stage::Enumerate, outcome)?;
        if subdomains.is_empty() {
            return Err(ReconError::EmptyResult { stage: Stage::Enumerate.name() });
        }

        let outcome = self.filter_active(job, &subdomains).await;
        let active = job.require(Stage::FilterActive, outcome)?;
        if active.is_empty() {
            return Err(ReconError::EmptyResult { stage: Stage::FilterActive.name() });
        }
        let active_names: Vec<String> = active.iter().map(|h| h.host.clone()).collect();

        let outcome = self.resolve_ips(job, &active).await;
        job.require(Stage::ResolveIps, outcome)?;

        let outcome = self.classify_non_cdn(job, &active).await;
        let non_cdn = job.require(Stage::ClassifyNonCdn, outcome)?;

        if features.vhost && !non_cdn.is_empty() {
            let outcome = self.vhost_discovery(job, &active_names, &non_cdn).await;
            job.optional(Stage::VhostDiscovery, outcome);
        }

        let outcome = self.forbidden_check(job, &active_names).await;
        let forbidden = job.require(Stage::ForbiddenCheck, outcome)?;

        if features.smart_fuzz {
            let outcome = self.smart_fuzz(job, &forbidden).await;
            job.optional(Stage::SmartFuzz, outcome);
        }

        let outcome = self.crawl(job, &active_names).await;
        let crawl = job.require(Stage::Crawl, outcome)?;

        let outcome = self.extract_js_urls(job, &crawl.urls).await;
        let js_urls = job.require(Stage::ExtractJsUrls, outcome)?;

        if features.js_fuzz {
            let outcome = self.js_fuzz(job, &js_urls).await;
            job.optional(Stage::JsFuzz, outcome);
        }

        let outcome = self.analyze_js(job, &js_urls).await;
        job.require(Stage::AnalyzeJs, outcome)?;

        let outcome = self.gf_analysis(job, &crawl.urls).await;
        let gf = job.require(Stage::GfAnalysis, outcome)?;

        if features.sqli {
            let outcome = self.sqli_scan(job, &gf.sqli).await;
            job.optional(Stage::SqliScan, outcome);
        }
        if features.nuclei {
            let outcome = self.nuclei_scan(job).await;
            job.optional(Stage::NucleiScan, outcome);
        }
        if features.wcd {
            let outcome = self.web_cache_deception(job, &crawl.static_urls).await;
            job.optional(Stage::WebCacheDeception, outcome);
        }
        Ok(())
    }
}
