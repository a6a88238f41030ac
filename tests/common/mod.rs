#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use sparky::config::Config;
use sparky::error::{ReconError, Result};
use sparky::external::{ToolCommand, ToolInvoker};
use sparky::options::{Features, Options};
use sparky::pipeline::StagePipeline;
use sparky::probe::NetworkProbe;

/// Scripted tool runner. Output is looked up by program name; ffuf writes
/// the CSV registered for its `-u` target to the `-o` path.
#[derive(Default)]
pub struct FakeInvoker {
    outputs: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    ffuf_csv: HashMap<String, String>,
    calls: Mutex<Vec<ToolCommand>>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, program: &str, stdout: &str) -> Self {
        self.outputs.insert(program.to_string(), stdout.as_bytes().to_vec());
        self
    }

    pub fn fail(mut self, program: &str) -> Self {
        self.failing.insert(program.to_string());
        self
    }

    pub fn ffuf(mut self, target: &str, csv: &str) -> Self {
        self.ffuf_csv.insert(target.to_string(), csv.to_string());
        self
    }

    pub fn calls(&self, program: &str) -> Vec<ToolCommand> {
        self.calls.lock().iter().filter(|c| c.program == program).cloned().collect()
    }
}

#[async_trait]
impl ToolInvoker for FakeInvoker {
    async fn run(&self, cmd: &ToolCommand) -> Result<Vec<u8>> {
        self.calls.lock().push(cmd.clone());
        if self.failing.contains(&cmd.program) {
            return Err(ReconError::invocation(&cmd.program, "exit status: 1"));
        }
        if cmd.program == "ffuf" {
            let target = cmd.flag_value("-u").unwrap_or_default();
            if let (Some(csv), Some(out)) = (self.ffuf_csv.get(target), cmd.flag_value("-o")) {
                std::fs::write(out, csv)?;
            }
        }
        Ok(self.outputs.get(&cmd.program).cloned().unwrap_or_default())
    }
}

/// In-memory DNS, status and HEAD answers.
#[derive(Default)]
pub struct FakeProbe {
    pub dns: HashMap<String, Vec<IpAddr>>,
    pub statuses: HashMap<String, u16>,
    pub heads: HashMap<String, BTreeMap<String, String>>,
}

impl FakeProbe {
    pub fn resolves(mut self, host: &str, ip: &str) -> Self {
        if let Ok(ip) = ip.parse() {
            self.dns.entry(host.to_string()).or_default().push(ip);
        }
        self
    }

    pub fn status(mut self, host: &str, code: u16) -> Self {
        self.statuses.insert(host.to_string(), code);
        self
    }

    pub fn head(mut self, url: &str, headers: &[(&str, &str)]) -> Self {
        let map = headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.heads.insert(url.to_string(), map);
        self
    }
}

#[async_trait]
impl NetworkProbe for FakeProbe {
    async fn resolve(&self, host: &str) -> Vec<IpAddr> {
        self.dns.get(host).cloned().unwrap_or_default()
    }

    async fn status(&self, host: &str) -> Option<u16> {
        self.statuses.get(host).copied()
    }

    async fn head(&self, url: &str) -> Result<BTreeMap<String, String>> {
        self.heads.get(url).cloned().ok_or_else(|| ReconError::invocation("HEAD", format!("{} unreachable", url)))
    }
}

pub fn test_config() -> Config {
    Config::from_yaml(
        "paths:\n  subdomains: wordlists/vhost.txt\n  backup_login: wordlists/backup.txt\n  js_smart_fuzzing: wordlists/js.txt\n\
tools:\n  linkfinder: lf/LinkFinder.py\n  secretfinder: sf/SecretFinder.py\n",
    )
    .unwrap()
}

pub fn pipeline(
    base: &Path,
    features: Features,
    invoker: Arc<FakeInvoker>,
    probe: FakeProbe,
) -> StagePipeline {
    let options = Arc::new(Options::new(features, 2, base.to_path_buf(), test_config()));
    StagePipeline::new(options, invoker, Arc::new(probe))
}
