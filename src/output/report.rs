use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;
use crate::output::artifact_store::{Artifact, ArtifactRef};
use crate::pipeline::{DomainJob, SkippedTarget, Stage, StageResult};
use crate::scheduler::DomainOutcome;

/// How a domain's pipeline ended, when it did not abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainStatus {
    Completed,
    /// Stopped after the named stage produced no records.
    Empty(&'static str),
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainStatus::Completed => f.write_str("completed"),
            DomainStatus::Empty(stage) => write!(f, "empty:{}", stage),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub ok: bool,
    pub produced: Vec<&'static str>,
}

impl From<&StageResult> for StageSummary {
    fn from(r: &StageResult) -> Self {
        Self { stage: r.stage, ok: r.ok, produced: r.produced.iter().map(|a| a.artifact.name()).collect() }
    }
}

/// Machine-readable record written to `report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct DomainReport {
    pub domain: String,
    pub new_vhost_subdomains: Vec<String>,
    pub status: String,
    pub cached_files: Vec<String>,
    pub smart_fuzz_hits: Vec<String>,
    pub new_js_files: Vec<String>,
    pub artifacts: BTreeMap<&'static str, PathBuf>,
    pub stages: Vec<StageSummary>,
    pub skipped: Vec<SkippedTarget>,
}

impl DomainReport {
    fn from_job(job: &DomainJob, status: DomainStatus) -> Self {
        let mut artifacts: BTreeMap<&'static str, PathBuf> =
            job.store.produced().iter().map(|r| (r.artifact.name(), r.path.clone())).collect();
        artifacts.insert(Artifact::Report.name(), job.store.path(Artifact::Report));

        Self {
            domain: job.domain.clone(),
            new_vhost_subdomains: job.discovered(Stage::VhostDiscovery),
            status: status.to_string(),
            cached_files: job.discovered(Stage::WebCacheDeception),
            smart_fuzz_hits: job.discovered(Stage::SmartFuzz),
            new_js_files: job.discovered(Stage::JsFuzz),
            artifacts,
            stages: job.results.iter().map(StageSummary::from).collect(),
            skipped: job.skipped.clone(),
        }
    }
}

pub struct ReportEmitter;

impl ReportEmitter {
    /// Write `report.json` for the job and print the human summary.
    pub async fn emit(job: &mut DomainJob, status: DomainStatus) -> Result<DomainReport> {
        let report = DomainReport::from_job(job, status);
        let r: ArtifactRef = job.store.write_json(Stage::Report, Artifact::Report, &report).await?;
        job.results.push(StageResult::ok(Stage::Report, vec![r]));

        print_summary(&report);
        Ok(report)
    }
}

fn print_summary(report: &DomainReport) {
    println!();
    println!("=== {} ({}) ===", report.domain, report.status);
    for (name, path) in &report.artifacts {
        println!("  {:<24} {}", name, path.display());
    }
    if !report.new_vhost_subdomains.is_empty() {
        println!("[+] New vhost subdomains: {}", report.new_vhost_subdomains.join(", "));
    }
    if !report.cached_files.is_empty() {
        println!("[+] Potentially cached files: {}", report.cached_files.len());
    }
    if !report.skipped.is_empty() {
        println!("[*] {} targets skipped", report.skipped.len());
    }
}

/// Per-run tally printed once every domain has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub empty: usize,
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn tally(outcomes: &[DomainOutcome<DomainReport>]) -> Self {
        let mut summary = Self::default();
        for o in outcomes {
            match &o.result {
                Ok(report) if report.status.starts_with("empty") => summary.empty += 1,
                Ok(_) => summary.completed += 1,
                Err(e) => summary.failed.push((o.domain.clone(), e.to_string())),
            }
        }
        summary.failed.sort();
        summary
    }

    pub fn print(&self) {
        println!();
        println!(
            "[*] Run finished: {} completed, {} empty, {} failed",
            self.completed,
            self.empty,
            self.failed.len()
        );
        for (domain, reason) in &self.failed {
            println!("  [!] {}: {}", domain, reason);
        }
    }
}
