use std::collections::BTreeSet;

/// Extensions dropped from the crawl output and probed by the cache check.
pub const STATIC_EXTENSIONS: &[&str] = &["css", "png", "jpg", "jpeg", "gif", "svg", "woff", "woff2", "ttf", "ico"];

/// Union of several tools' line output: trimmed, deduplicated, sorted.
pub fn merge_unique<'a, I>(outputs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut set = BTreeSet::new();
    for out in outputs {
        for line in crate::utils::non_empty_lines(out) {
            set.insert(line.to_string());
        }
    }
    set.into_iter().collect()
}

fn extension(u: &str) -> Option<&str> {
    let last = u.rsplit('/').next().unwrap_or(u);
    last.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn is_static_asset(u: &str) -> bool {
    extension(u).map(|ext| STATIC_EXTENSIONS.contains(&ext)).unwrap_or(false)
}

pub fn is_js_url(u: &str) -> bool {
    u.to_ascii_lowercase().ends_with(".js")
}

/// Split crawl output into (urls, static assets).
pub fn partition_static(lines: Vec<String>) -> (Vec<String>, Vec<String>) {
    lines.into_iter().partition(|l| !is_static_asset(l))
}

pub fn js_urls(urls: &[String]) -> Vec<String> {
    urls.iter().filter(|u| is_js_url(u)).cloned().collect()
}
