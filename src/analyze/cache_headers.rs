use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of the cache check on one static asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WcdResult {
    pub url: String,
    pub cached: bool,
    pub cache_headers: BTreeMap<String, String>,
}

impl WcdResult {
    pub fn analyze(url: &str, headers: BTreeMap<String, String>) -> Self {
        WcdResult { url: url.to_string(), cached: is_cached(&headers), cache_headers: headers }
    }
}

/// A response looks cacheable when Cache-Control is public or carries a
/// max-age, or when any of ETag, Last-Modified or Age is present.
/// Header names compare case-insensitively.
pub fn is_cached(headers: &BTreeMap<String, String>) -> bool {
    headers.iter().any(|(name, value)| {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "cache-control" => {
                let value = value.to_ascii_lowercase();
                value.contains("public") || value.contains("max-age")
            }
            "etag" | "last-modified" | "age" => true,
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn public_cache_control_is_cached() {
        assert!(is_cached(&headers(&[("Cache-Control", "public, max-age=600")])));
        assert!(is_cached(&headers(&[("cache-control", "max-age=60")])));
        assert!(!is_cached(&headers(&[("Cache-Control", "no-store, private")])));
    }

    #[test]
    fn validators_alone_mark_cached() {
        assert!(is_cached(&headers(&[("ETag", "abc")])));
        assert!(is_cached(&headers(&[("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT")])));
        assert!(is_cached(&headers(&[("Age", "12")])));
    }

    #[test]
    fn content_type_alone_is_not_cached() {
        let r = WcdResult::analyze("https://a.co/x.css", headers(&[("Content-Type", "text/css")]));
        assert!(!r.cached);
        assert_eq!(r.cache_headers.get("Content-Type").map(String::as_str), Some("text/css"));
    }
}
