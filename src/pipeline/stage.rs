use serde::Serialize;
use std::fmt;

use crate::output::artifact_store::ArtifactRef;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Enumerate,
    FilterActive,
    ResolveIps,
    ClassifyNonCdn,
    VhostDiscovery,
    ForbiddenCheck,
    SmartFuzz,
    Crawl,
    ExtractJsUrls,
    JsFuzz,
    AnalyzeJs,
    GfAnalysis,
    SqliScan,
    NucleiScan,
    WebCacheDeception,
    Report,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Enumerate => "enumerate",
            Stage::FilterActive => "filter_active",
            Stage::ResolveIps => "resolve_ips",
            Stage::ClassifyNonCdn => "classify_non_cdn",
            Stage::VhostDiscovery => "vhost_discovery",
            Stage::ForbiddenCheck => "forbidden_check",
            Stage::SmartFuzz => "smart_fuzz",
            Stage::Crawl => "crawl",
            Stage::ExtractJsUrls => "extract_js_urls",
            Stage::JsFuzz => "js_fuzz",
            Stage::AnalyzeJs => "analyze_js",
            Stage::GfAnalysis => "gf_analysis",
            Stage::SqliScan => "sqli_scan",
            Stage::NucleiScan => "nuclei_scan",
            Stage::WebCacheDeception => "web_cache_deception",
            Stage::Report => "report",
        }
    }

    /// Failure to build the merged artifact of these stages aborts the domain.
    pub fn is_load_bearing(&self) -> bool {
        matches!(
            self,
            Stage::Enumerate
                | Stage::FilterActive
                | Stage::ResolveIps
                | Stage::ClassifyNonCdn
                | Stage::ForbiddenCheck
                | Stage::Crawl
                | Stage::ExtractJsUrls
        )
    }

    /// Flag-gated stages; their failure never aborts the domain.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            Stage::VhostDiscovery
                | Stage::SmartFuzz
                | Stage::JsFuzz
                | Stage::SqliScan
                | Stage::NucleiScan
                | Stage::WebCacheDeception
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a stage hands back to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub ok: bool,
    pub produced: Vec<ArtifactRef>,
    /// New subdomains, cached URLs and the like, passed straight to the report.
    pub discovered: Vec<String>,
}

impl StageResult {
    pub fn ok(stage: Stage, produced: Vec<ArtifactRef>) -> Self {
        Self { stage, ok: true, produced, discovered: Vec::new() }
    }

    pub fn failed(stage: Stage) -> Self {
        Self { stage, ok: false, produced: Vec::new(), discovered: Vec::new() }
    }

    pub fn with_discovered(mut self, discovered: Vec<String>) -> Self {
        self.discovered = discovered;
        self
    }
}

/// A stage's in-process output alongside its result record.
#[derive(Debug)]
pub struct Staged<T> {
    pub value: T,
    pub result: StageResult,
}

impl<T> Staged<T> {
    pub fn new(value: T, result: StageResult) -> Self {
        Self { value, result }
    }
}

/// A target a tolerant stage skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTarget {
    pub stage: Stage,
    pub target: String,
    pub reason: String,
}

/// Accumulates per-target outcomes of a tolerant loop.
#[derive(Debug)]
pub struct TargetFold<T> {
    stage: Stage,
    pub succeeded: Vec<T>,
    pub skipped: Vec<SkippedTarget>,
}

impl<T> TargetFold<T> {
    pub fn new(stage: Stage) -> Self {
        Self { stage, succeeded: Vec::new(), skipped: Vec::new() }
    }

    pub fn record<E: fmt::Display>(&mut self, target: &str, outcome: std::result::Result<T, E>) {
        match outcome {
            Ok(v) => self.succeeded.push(v),
            Err(e) => self.skip(target, e),
        }
    }

    pub fn skip(&mut self, target: &str, reason: impl fmt::Display) {
        tracing::debug!(stage = %self.stage, target, reason = %reason, "skipping target");
        self.skipped.push(SkippedTarget { stage: self.stage, target: target.to_string(), reason: reason.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_and_policy_partition() {
        assert!(Stage::Enumerate < Stage::VhostDiscovery && Stage::VhostDiscovery < Stage::ForbiddenCheck);
        assert!(Stage::WebCacheDeception < Stage::Report);
        for s in [Stage::Enumerate, Stage::FilterActive, Stage::JsFuzz, Stage::AnalyzeJs, Stage::Report] {
            assert!(!(s.is_load_bearing() && s.is_optional()), "{} is both", s);
        }
        assert!(Stage::Crawl.is_load_bearing());
        assert!(Stage::SqliScan.is_optional());
        assert!(!Stage::AnalyzeJs.is_load_bearing() && !Stage::AnalyzeJs.is_optional());
    }

    #[test]
    fn fold_keeps_skip_reasons() {
        let mut fold = TargetFold::new(Stage::SqliScan);
        fold.record("a", Ok::<_, String>(1));
        fold.record("b", Err::<i32, _>("exit status 1"));
        assert_eq!(fold.succeeded, vec![1]);
        assert_eq!(fold.skipped[0].target, "b");
        assert_eq!(fold.skipped[0].reason, "exit status 1");
        assert_eq!(fold.skipped.len(), 1);
    }
}
