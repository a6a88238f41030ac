use std::collections::BTreeSet;

/// A directory seen among JS URLs, to be fuzzed for sibling files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuzzTarget {
    /// `<scheme>://<host>`
    pub origin: String,
    /// Path between host and file name, without surrounding slashes.
    pub prefix: String,
}

impl FuzzTarget {
    pub fn fuzz_url(&self) -> String {
        format!("{}/{}/FUZZ", self.origin, self.prefix)
    }

    pub fn candidate(&self, name: &str) -> String {
        format!("{}/{}/{}", self.origin, self.prefix, name)
    }
}

/// Directory prefix of a JS URL: the third-and-later `/` segments minus the
/// file name. URLs with fewer than four segments, or with the file directly
/// under the host, yield nothing.
pub fn js_prefix(url: &str) -> Option<FuzzTarget> {
    let parts: Vec<&str> = url.trim().split('/').collect();
    if parts.len() < 4 {
        return None;
    }
    let prefix = parts[3..parts.len() - 1].join("/");
    if prefix.is_empty() {
        return None;
    }
    Some(FuzzTarget { origin: parts[..3].join("/"), prefix })
}

/// Distinct (origin, prefix) pairs across all JS URLs, sorted.
pub fn fuzz_targets<'a, I>(js_urls: I) -> Vec<FuzzTarget>
where
    I: IntoIterator<Item = &'a str>,
{
    js_urls.into_iter().filter_map(js_prefix).collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_urls_have_no_prefix() {
        assert_eq!(js_prefix("https://a.co/app.js"), None);
        assert_eq!(js_prefix("https://a.co"), None);
    }

    #[test]
    fn nested_url_yields_directory() {
        let t = js_prefix("https://a.co/static/v2/app.js").unwrap();
        assert_eq!(t.origin, "https://a.co");
        assert_eq!(t.prefix, "static/v2");
        assert_eq!(t.fuzz_url(), "https://a.co/static/v2/FUZZ");
        assert_eq!(t.candidate("vendor.js"), "https://a.co/static/v2/vendor.js");
    }

    #[test]
    fn targets_are_distinct_per_host_and_prefix() {
        let targets = fuzz_targets([
            "https://a.co/static/v2/app.js",
            "https://a.co/static/v2/chunk.js",
            "https://b.co/static/v2/app.js",
            "https://a.co/main.js",
        ]);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].origin, "https://a.co");
        assert_eq!(targets[1].origin, "https://b.co");
    }
}
