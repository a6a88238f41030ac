use std::collections::BTreeMap;

use sparky::analyze::cache_headers::{is_cached, WcdResult};
use sparky::dedup::{canonicalize, fuzz_targets, js_prefix, new_vhost_subdomains, scan_targets};
use sparky::filter::merge_unique;

#[test]
fn sqli_targets_collapse_on_base_and_first_param() {
    assert_eq!(canonicalize("https://a.co/x?id=1&y=2").as_deref(), Some("https://a.co/x?id=1"));
    let targets = scan_targets(["https://a.co/x?id=1&y=2", "https://a.co/x?id=1&z=3", "https://a.co/plain"]);
    assert_eq!(targets, vec!["https://a.co/x?id=1"]);

    let distinct = scan_targets(["https://a.co/x?id=1", "https://a.co/x?id=2", "https://a.co/y?id=1"]);
    assert_eq!(distinct.len(), 3);
}

#[test]
fn js_prefix_needs_a_directory() {
    assert!(js_prefix("https://a.co/app.js").is_none());
    assert_eq!(js_prefix("https://a.co/static/v2/app.js").map(|t| t.prefix), Some("static/v2".to_string()));

    let targets = fuzz_targets([
        "https://a.co/static/v2/app.js",
        "https://a.co/static/v2/vendor.js",
        "https://b.co/static/v2/app.js",
        "https://a.co/root.js",
    ]);
    let urls: Vec<String> = targets.iter().map(|t| t.fuzz_url()).collect();
    assert_eq!(urls, vec!["https://a.co/static/v2/FUZZ", "https://b.co/static/v2/FUZZ"]);
}

#[test]
fn vhost_diff_reports_only_unknown_hosts() {
    let active = vec!["a.x.com".to_string(), "b.x.com".to_string()];
    assert_eq!(new_vhost_subdomains(&active, "a.x.com\nc.x.com", "x.com"), vec!["c.x.com"]);
}

#[test]
fn cache_heuristic_examples() {
    let h = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    };
    assert!(is_cached(&h(&[("Cache-Control", "public, max-age=600")])));
    assert!(!is_cached(&h(&[("Content-Type", "text/css")])));
    assert!(is_cached(&h(&[("ETag", "abc")])));

    let r = WcdResult::analyze("https://a.co/x.css", h(&[("Age", "12")]));
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["cached"], true);
    assert_eq!(json["cache_headers"]["Age"], "12");
}

#[test]
fn enumerate_merge_is_idempotent() {
    let tool_a = "b.x.com\na.x.com\n";
    let tool_b = "c.x.com\na.x.com";
    let first = merge_unique([tool_a, tool_b]);
    let again = merge_unique([tool_b, tool_a]);
    assert_eq!(first, again);
    assert_eq!(first, vec!["a.x.com", "b.x.com", "c.x.com"]);
}
