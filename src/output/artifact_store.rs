use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{ReconError, Result};
use crate::pipeline::stage::Stage;

/// Named per-domain outputs and their location under `recon_<domain>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Subdomains,
    ActiveSubdomains,
    Ips,
    NonCdnIps,
    Vhost,
    NewVhostSubdomains,
    ForbiddenSubdomains,
    SmartFuzzing,
    SmartFuzzing200,
    Urls,
    StaticUrls,
    JsUrls,
    NewJsFiles,
    JsAnalysis,
    GfSsrf,
    GfSqli,
    SqliResults,
    NucleiResults,
    WcdResults,
    Report,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Subdomains => "subdomains.txt",
            Artifact::ActiveSubdomains => "active_subdomains.txt",
            Artifact::Ips => "ips.txt",
            Artifact::NonCdnIps => "non_cdn_ips.txt",
            Artifact::Vhost => "vhost.txt",
            Artifact::NewVhostSubdomains => "new_vhost_subdomains.txt",
            Artifact::ForbiddenSubdomains => "forbidden_subdomains.txt",
            Artifact::SmartFuzzing => "smart_fuzzing.txt",
            Artifact::SmartFuzzing200 => "smart_fuzzing_200.txt",
            Artifact::Urls => "urls.txt",
            Artifact::StaticUrls => "static_urls.txt",
            Artifact::JsUrls => "js_urls.txt",
            Artifact::NewJsFiles => "new_js_files.txt",
            Artifact::JsAnalysis => "js_analysis.txt",
            Artifact::GfSsrf => "gf/gf_ssrf.txt",
            Artifact::GfSqli => "gf/gf_sqli.txt",
            Artifact::SqliResults => "sqli_results.txt",
            Artifact::NucleiResults => "nuclei_results.txt",
            Artifact::WcdResults => "wcd/wcd_results.json",
            Artifact::Report => "report.json",
        }
    }

    /// Report key, e.g. `smart_fuzzing_200`.
    pub fn name(&self) -> &'static str {
        let file = self.file_name();
        let file = file.rsplit('/').next().unwrap_or(file);
        file.split('.').next().unwrap_or(file)
    }
}

/// (domain, stage, artifact) resolved to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub domain: String,
    pub stage: Stage,
    pub artifact: Artifact,
    pub path: PathBuf,
}

/// File-backed store for one domain job. Each artifact has a single writer
/// stage per run; a second stage writing it is a `StageIo` error.
#[derive(Debug)]
pub struct ArtifactStore {
    domain: String,
    root: PathBuf,
    owners: HashMap<Artifact, Stage>,
    produced: Vec<ArtifactRef>,
}

impl ArtifactStore {
    pub async fn create(root: PathBuf, domain: &str) -> Result<Self> {
        fs::create_dir_all(&root)
            .await
            .map_err(|e| ReconError::stage_io("setup", format!("{}: {}", root.display(), e)))?;
        Ok(Self { domain: domain.to_string(), root, owners: HashMap::new(), produced: Vec::new() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.root.join(artifact.file_name())
    }

    /// Location for raw tool output kept for audit, e.g. ffuf CSV files.
    pub async fn scratch_path(&self, stage: Stage, name: &str) -> Result<PathBuf> {
        let dir = self.root.join("raw");
        fs::create_dir_all(&dir).await.map_err(|e| ReconError::stage_io(stage.name(), e))?;
        Ok(dir.join(name))
    }

    pub fn produced(&self) -> &[ArtifactRef] {
        &self.produced
    }

    /// Returns true the first time `stage` claims `artifact`.
    fn claim(&mut self, stage: Stage, artifact: Artifact) -> Result<(bool, ArtifactRef)> {
        let r = ArtifactRef { domain: self.domain.clone(), stage, artifact, path: self.path(artifact) };
        match self.owners.get(&artifact) {
            Some(owner) if *owner != stage => Err(ReconError::stage_io(
                stage.name(),
                format!("{} already written by {}", artifact.file_name(), owner.name()),
            )),
            Some(_) => Ok((false, r)),
            None => {
                self.owners.insert(artifact, stage);
                self.produced.push(r.clone());
                Ok((true, r))
            }
        }
    }

    pub async fn write_bytes(&mut self, stage: Stage, artifact: Artifact, data: &[u8]) -> Result<ArtifactRef> {
        let (_, r) = self.claim(stage, artifact)?;
        ensure_parent(stage, &r.path).await?;
        fs::write(&r.path, data)
            .await
            .map_err(|e| ReconError::stage_io(stage.name(), format!("{}: {}", r.path.display(), e)))?;
        Ok(r)
    }

    pub async fn write_lines(&mut self, stage: Stage, artifact: Artifact, lines: &[String]) -> Result<ArtifactRef> {
        let mut data = lines.join("\n");
        if !data.is_empty() {
            data.push('\n');
        }
        self.write_bytes(stage, artifact, data.as_bytes()).await
    }

    pub async fn write_json<T: Serialize + ?Sized>(&mut self, stage: Stage, artifact: Artifact, value: &T) -> Result<ArtifactRef> {
        let data = serde_json::to_vec_pretty(value).map_err(|e| ReconError::stage_io(stage.name(), e))?;
        self.write_bytes(stage, artifact, &data).await
    }

    /// Append to an artifact; the first append of a run truncates leftovers
    /// from earlier runs.
    pub async fn append(&mut self, stage: Stage, artifact: Artifact, data: &[u8]) -> Result<ArtifactRef> {
        let (first, r) = self.claim(stage, artifact)?;
        ensure_parent(stage, &r.path).await?;
        let mut opts = OpenOptions::new();
        opts.create(true);
        if first {
            opts.write(true).truncate(true);
        } else {
            opts.append(true);
        }
        let mut f = opts
            .open(&r.path)
            .await
            .map_err(|e| ReconError::stage_io(stage.name(), format!("{}: {}", r.path.display(), e)))?;
        f.write_all(data).await.map_err(|e| ReconError::stage_io(stage.name(), e))?;
        if !data.is_empty() && !data.ends_with(b"\n") {
            f.write_all(b"\n").await.map_err(|e| ReconError::stage_io(stage.name(), e))?;
        }
        f.flush().await.map_err(|e| ReconError::stage_io(stage.name(), e))?;
        Ok(r)
    }
}

async fn ensure_parent(stage: Stage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| ReconError::stage_io(stage.name(), e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_follow_file_layout() {
        assert_eq!(Artifact::GfSqli.file_name(), "gf/gf_sqli.txt");
        assert_eq!(Artifact::GfSqli.name(), "gf_sqli");
        assert_eq!(Artifact::SmartFuzzing200.name(), "smart_fuzzing_200");
        assert_eq!(Artifact::WcdResults.name(), "wcd_results");
    }

    #[tokio::test]
    async fn single_writer_per_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::create(dir.path().join("recon_x.com"), "x.com").await.unwrap();
        store.write_lines(Stage::Enumerate, Artifact::Subdomains, &["a.x.com".into()]).await.unwrap();
        let err = store.write_lines(Stage::Crawl, Artifact::Subdomains, &[]).await.unwrap_err();
        assert!(matches!(err, ReconError::StageIo { stage: "crawl", .. }));
        assert_eq!(store.produced().len(), 1);
        let text = std::fs::read_to_string(store.path(Artifact::Subdomains)).unwrap();
        assert_eq!(text, "a.x.com\n");
    }

    #[tokio::test]
    async fn first_append_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recon_x.com");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("sqli_results.txt"), "stale\n").unwrap();

        let mut store = ArtifactStore::create(root, "x.com").await.unwrap();
        store.append(Stage::SqliScan, Artifact::SqliResults, b"one").await.unwrap();
        store.append(Stage::SqliScan, Artifact::SqliResults, b"two\n").await.unwrap();
        let text = std::fs::read_to_string(store.path(Artifact::SqliResults)).unwrap();
        assert_eq!(text, "one\ntwo\n");
    }
}
