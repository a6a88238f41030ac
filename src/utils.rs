use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Reduce `https://host/...` to `host`; bare names pass through trimmed.
pub fn normalize_domain(target: &str) -> String {
    let target = target.trim();
    if target.starts_with("http://") || target.starts_with("https://") {
        match url::Url::parse(target) {
            Ok(u) => u.host_str().map(|s| s.to_string()).unwrap_or_else(|| target.to_string()),
            Err(_) => target.to_string(),
        }
    } else {
        target.trim_end_matches('/').to_string()
    }
}

/// Parse a domain list: one per line, `#` comments and blanks skipped,
/// duplicates dropped keeping the first occurrence.
pub fn parse_domain_list(data: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let domain = normalize_domain(trimmed);
        if seen.insert(domain.clone()) {
            out.push(domain);
        }
    }
    out
}

pub fn read_domains(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = fs::read_to_string(path)?;
    Ok(parse_domain_list(&data))
}

/// Non-empty trimmed lines of a tool's output.
pub fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}
