use std::path::PathBuf;

use super::{DomainJob, Stage, StagePipeline, StageResult, Staged, TargetFold};
use crate::error::{ReconError, Result};
use crate::external::tools;
use crate::filter::{merge_unique, url_filters};
use crate::output::artifact_store::Artifact;

/// Crawl output split into probe-able URLs and static assets.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutput {
    pub urls: Vec<String>,
    pub static_urls: Vec<String>,
}

/// gf candidates per category.
#[derive(Debug, Clone, Default)]
pub struct GfOutput {
    pub ssrf: Vec<String>,
    pub sqli: Vec<String>,
}

/// File name for a downloaded script; the index keeps same-named files from
/// different hosts apart.
fn js_file_name(idx: usize, url: &str) -> String {
    let base = url.rsplit('/').next().unwrap_or("script.js");
    let base: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    format!("{:04}_{}", idx, if base.is_empty() { "script.js".to_string() } else { base })
}

impl StagePipeline {
    pub(crate) async fn crawl(&self, job: &mut DomainJob, active: &[String]) -> Result<Staged<CrawlOutput>> {
        let stage = Stage::Crawl;
        println!("[*] Crawling subdomains for {}...", job.domain);

        let list = job.store.path(Artifact::ActiveSubdomains);
        let mut fold = TargetFold::new(stage);
        for cmd in tools::crawlers(&list, active) {
            let out = self.invoker.run(&cmd).await;
            fold.record(&cmd.program, out.map(|b| String::from_utf8_lossy(&b).into_owned()));
        }
        if fold.succeeded.is_empty() {
            let reasons: Vec<String> = fold.skipped.iter().map(|s| s.reason.clone()).collect();
            return Err(ReconError::stage_io(stage.name(), format!("all crawlers failed: {}", reasons.join("; "))));
        }
        let outputs = job.absorb(fold);
        let (urls, static_urls) = url_filters::partition_static(merge_unique(outputs.iter().map(String::as_str)));

        let produced = vec![
            job.store.write_lines(stage, Artifact::Urls, &urls).await?,
            job.store.write_lines(stage, Artifact::StaticUrls, &static_urls).await?,
        ];
        println!("[+] {}: {} URLs ({} static assets set aside)", job.domain, urls.len(), static_urls.len());
        Ok(Staged::new(CrawlOutput { urls, static_urls }, StageResult::ok(stage, produced)))
    }

    pub(crate) async fn extract_js_urls(&self, job: &mut DomainJob, urls: &[String]) -> Result<Staged<Vec<String>>> {
        let stage = Stage::ExtractJsUrls;
        let js = url_filters::js_urls(urls);
        let r = job.store.write_lines(stage, Artifact::JsUrls, &js).await?;
        println!("[*] Extracted {} JavaScript URLs", js.len());
        Ok(Staged::new(js, StageResult::ok(stage, vec![r])))
    }

    /// Download and beautify one script; returns the beautified file.
    async fn fetch_and_beautify(&self, dir: &std::path::Path, idx: usize, url: &str) -> Result<PathBuf> {
        let body = self.invoker.run(&tools::fetch(url)).await?;
        if body.is_empty() {
            return Err(ReconError::invocation("curl", "empty body"));
        }
        let file = dir.join(js_file_name(idx, url));
        tokio::fs::write(&file, &body).await?;

        let pretty = self.invoker.run(&tools::beautify(&file)).await?;
        let beautified = PathBuf::from(format!("{}.beautified", file.display()));
        tokio::fs::write(&beautified, &pretty).await?;
        Ok(beautified)
    }

    /// Fetch, beautify and run the link/secret extractors over every JS URL.
    /// A URL that fails at any step is skipped.
    pub(crate) async fn analyze_js(&self, job: &mut DomainJob, js_urls: &[String]) -> Result<Staged<()>> {
        let stage = Stage::AnalyzeJs;
        println!("[*] JS analysis for {} ({} files)...", job.domain, js_urls.len());

        let dir = job.store.root().join("js_files");
        tokio::fs::create_dir_all(&dir).await.map_err(|e| ReconError::stage_io(stage.name(), e))?;
        let r = job.store.append(stage, Artifact::JsAnalysis, b"").await?;

        let extractors: Vec<(&str, PathBuf)> = tools::EXTRACTORS
            .iter()
            .filter_map(|name| self.options.config.tool_path(name).map(|p| (*name, p)))
            .collect();

        let mut fold = TargetFold::new(stage);
        for (idx, url) in js_urls.iter().enumerate() {
            let beautified = match self.fetch_and_beautify(&dir, idx, url).await {
                Ok(p) => p,
                Err(e) => {
                    fold.skip(url, e);
                    continue;
                }
            };
            for (name, script) in &extractors {
                match self.invoker.run(&tools::extractor(script, &beautified)).await {
                    Ok(out) if !out.is_empty() => {
                        let mut chunk = format!("[{}] {}\n", name, url).into_bytes();
                        chunk.extend_from_slice(&out);
                        job.store.append(stage, Artifact::JsAnalysis, &chunk).await?;
                        fold.record(url, Ok::<_, ReconError>(()));
                    }
                    Ok(_) => fold.record(url, Ok::<_, ReconError>(())),
                    Err(e) => fold.skip(&format!("{} [{}]", url, name), e),
                }
            }
        }
        job.absorb(fold);
        Ok(Staged::new((), StageResult::ok(stage, vec![r])))
    }

    /// Split URLs into SSRF and SQLi candidates with gf. A failing pattern
    /// leaves an empty category.
    pub(crate) async fn gf_analysis(&self, job: &mut DomainJob, urls: &[String]) -> Result<Staged<GfOutput>> {
        let stage = Stage::GfAnalysis;
        println!("[*] Analyzing URLs for SSRF and SQLi...");

        let input = urls.join("\n").into_bytes();
        let mut fold = TargetFold::new(stage);
        let mut output = GfOutput::default();
        let mut produced = Vec::new();
        for (pattern, artifact) in [("ssrf", Artifact::GfSsrf), ("sqli", Artifact::GfSqli)] {
            let lines = match self.invoker.run(&tools::gf(pattern, &input)).await {
                Ok(out) => merge_unique([&*String::from_utf8_lossy(&out)]),
                Err(e) => {
                    fold.skip(pattern, e);
                    Vec::new()
                }
            };
            produced.push(job.store.write_lines(stage, artifact, &lines).await?);
            match pattern {
                "ssrf" => output.ssrf = lines,
                _ => output.sqli = lines,
            }
        }
        job.absorb::<()>(fold);
        Ok(Staged::new(output, StageResult::ok(stage, produced)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_file_names_are_unique_and_safe() {
        assert_eq!(js_file_name(3, "https://a.co/static/app.js"), "0003_app.js");
        assert_eq!(js_file_name(4, "https://b.co/x/a b?.js"), "0004_a_b_.js");
        assert_eq!(js_file_name(0, "https://a.co/"), "0000_script.js");
    }
}
