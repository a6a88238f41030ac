use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ReconError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_LINKFINDER: &str = "toolssparky/linkfinder/LinkFinder.py";
pub const DEFAULT_SECRETFINDER: &str = "toolssparky/SecretFinder/SecretFinder.py";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Vhost wordlist (Host header prefixes)
    pub subdomains: String,
    /// Optional resolver list, one IP per line
    pub resolvers: String,
    pub backup_login: String,
    #[serde(alias = "js-smart-fuzzing")]
    pub js_smart_fuzzing: String,
    pub output_dir: String,
    pub nuclei_templates: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub threads: usize,
    pub timeout: u64,
    pub probe_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { threads: 1, timeout: 10, probe_concurrency: 20 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub settings: Settings,
    pub tools: HashMap<String, String>,
    /// Extra CIDR ranges treated as CDN space on top of the built-in table.
    pub cdn_ranges: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let mut cfg: Config = serde_yaml::from_str(data).map_err(|e| ReconError::Config(e.to_string()))?;
        cfg.fill_tool_defaults();
        if cfg.settings.threads == 0 {
            return Err(ReconError::Config("settings.threads must be at least 1".into()));
        }
        if cfg.settings.probe_concurrency == 0 {
            cfg.settings.probe_concurrency = Settings::default().probe_concurrency;
        }
        Ok(cfg)
    }

    fn fill_tool_defaults(&mut self) {
        self.tools.entry("linkfinder".into()).or_insert_with(|| DEFAULT_LINKFINDER.into());
        self.tools.entry("secretfinder".into()).or_insert_with(|| DEFAULT_SECRETFINDER.into());
    }

    /// Path of a script-based extractor (`linkfinder` / `secretfinder`).
    pub fn tool_path(&self, name: &str) -> Option<PathBuf> {
        self.tools.get(name).filter(|p| !p.is_empty()).map(PathBuf::from)
    }

    pub fn output_base(&self) -> Option<PathBuf> {
        if self.paths.output_dir.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.paths.output_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_and_fills_extractor_defaults() {
        let cfg = Config::from_yaml(
            "paths:\n  subdomains: vh.txt\n  js-smart-fuzzing: js.txt\nsettings:\n  threads: 4\n",
        )
        .unwrap();
        assert_eq!(cfg.paths.subdomains, "vh.txt");
        assert_eq!(cfg.paths.js_smart_fuzzing, "js.txt");
        assert_eq!(cfg.settings.threads, 4);
        assert_eq!(cfg.settings.timeout, 10);
        assert_eq!(cfg.tool_path("linkfinder"), Some(PathBuf::from(DEFAULT_LINKFINDER)));
        assert!(cfg.output_base().is_none());
    }

    #[test]
    fn rejects_zero_threads() {
        assert!(matches!(
            Config::from_yaml("settings:\n  threads: 0\n"),
            Err(ReconError::Config(_))
        ));
    }
}
