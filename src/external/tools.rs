use std::path::Path;
use which::which;

use crate::config::Config;
use crate::error::{ReconError, Result};
use crate::external::runner::ToolCommand;
use crate::options::Features;

/// Binaries every scan needs.
pub const CORE_TOOLS: &[&str] = &[
    "subfinder", "assetfinder", "amass", "waybackurls", "katana", "hakrawler",
    "gf", "jsbeautifier", "curl", "python3",
];

/// Script extractors resolved through `Config::tools`.
pub const EXTRACTORS: &[&str] = &["linkfinder", "secretfinder"];

/// Binaries needed for the enabled feature set.
pub fn required_tools(features: &Features) -> Vec<&'static str> {
    let mut tools = CORE_TOOLS.to_vec();
    if features.vhost || features.smart_fuzz || features.js_fuzz {
        tools.push("ffuf");
    }
    if features.sqli {
        tools.push("sqlmap");
    }
    if features.nuclei {
        tools.push("nuclei");
    }
    tools
}

/// Availability of one tool, for the `check-deps` table.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: String,
    pub location: Option<String>,
}

pub fn tool_statuses(cfg: &Config, features: &Features) -> Vec<ToolStatus> {
    let mut out: Vec<ToolStatus> = required_tools(features)
        .into_iter()
        .map(|name| ToolStatus {
            name: name.to_string(),
            location: which(name).ok().map(|p| p.display().to_string()),
        })
        .collect();
    for name in EXTRACTORS {
        let location = cfg.tool_path(name).filter(|p| p.exists()).map(|p| p.display().to_string());
        out.push(ToolStatus { name: name.to_string(), location });
    }
    out
}

/// Fails with `ToolUnavailable` on the first missing binary or extractor script.
pub fn check_dependencies(cfg: &Config, features: &Features) -> Result<()> {
    for status in tool_statuses(cfg, features) {
        if status.location.is_none() {
            let hint = if EXTRACTORS.contains(&status.name.as_str()) {
                format!("script {} does not exist", cfg.tool_path(&status.name).unwrap_or_default().display())
            } else {
                "install it and make sure it is on PATH".to_string()
            };
            return Err(ReconError::ToolUnavailable { tool: status.name, hint });
        }
    }
    Ok(())
}

pub fn enumerators(domain: &str) -> Vec<ToolCommand> {
    vec![
        ToolCommand::new("subfinder").args(["-d", domain, "-all", "-silent"]),
        ToolCommand::new("assetfinder").args(["--subs-only", domain]),
        ToolCommand::new("amass").args(["enum", "-passive", "-d", domain]),
    ]
}

/// Crawlers fed with the active-subdomain list.
pub fn crawlers(active_list: &Path, active: &[String]) -> Vec<ToolCommand> {
    let stdin = active.join("\n").into_bytes();
    vec![
        ToolCommand::new("waybackurls").stdin(stdin.clone()),
        ToolCommand::new("katana").args(["-list", &active_list.display().to_string(), "-jc", "-silent"]),
        ToolCommand::new("hakrawler").args(["-d", "2", "-t", "8"]).stdin(stdin),
    ]
}

pub fn ffuf_vhost(wordlist: &str, ip: &str, domain: &str, out_csv: &Path) -> ToolCommand {
    ToolCommand::new("ffuf").args([
        "-w", wordlist,
        "-u", &format!("http://{}/", ip),
        "-H", &format!("Host: FUZZ.{}", domain),
        "-fc", "404",
        "-s",
        "-o", &out_csv.display().to_string(),
        "-of", "csv",
    ])
}

pub fn ffuf_smart(wordlist: &str, subdomain: &str, out_csv: &Path) -> ToolCommand {
    ToolCommand::new("ffuf").args([
        "-w", wordlist,
        "-u", &format!("https://{}/FUZZ", subdomain),
        "-fc", "403,404",
        "-s",
        "-o", &out_csv.display().to_string(),
        "-of", "csv",
    ])
}

pub fn ffuf_js(wordlist: &str, target: &str, out_csv: &Path) -> ToolCommand {
    ToolCommand::new("ffuf").args([
        "-w", wordlist,
        "-u", target,
        "-mc", "200",
        "-s",
        "-o", &out_csv.display().to_string(),
        "-of", "csv",
    ])
}

pub fn fetch(url: &str) -> ToolCommand {
    ToolCommand::new("curl").args(["-s", "-k", "-L", "--max-time", "30", url])
}

pub fn beautify(file: &Path) -> ToolCommand {
    ToolCommand::new("jsbeautifier").arg(file.display().to_string())
}

/// `python3 <script> -i <file> -o cli`, run from the script's directory.
pub fn extractor(script: &Path, input: &Path) -> ToolCommand {
    let cmd = ToolCommand::new("python3").args([
        script.display().to_string(),
        "-i".to_string(),
        input.display().to_string(),
        "-o".to_string(),
        "cli".to_string(),
    ]);
    match script.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => cmd.current_dir(dir),
        None => cmd,
    }
}

pub fn gf(pattern: &str, urls: &[u8]) -> ToolCommand {
    ToolCommand::new("gf").arg(pattern).stdin(urls.to_vec())
}

pub fn sqlmap(url: &str) -> ToolCommand {
    ToolCommand::new("sqlmap").args(["-u", url, "--dbs", "--random-agent", "--batch"])
}

pub fn nuclei(list: &Path, templates: &str) -> ToolCommand {
    let mut cmd = ToolCommand::new("nuclei").args(["-l", &list.display().to_string(), "-silent"]);
    if !templates.is_empty() {
        cmd = cmd.args(["-t", templates]);
    }
    cmd
}
