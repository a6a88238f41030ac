use std::collections::BTreeSet;

/// Canonical scan key for an injection candidate: `base?firstParam`.
///
/// Everything from the first `&` on is dropped. URLs without a query string
/// (or with an empty one) have no key.
pub fn canonicalize(url: &str) -> Option<String> {
    let url = url.trim();
    let (base, query) = url.split_once('?')?;
    let first = query.split('&').next().unwrap_or("");
    if base.is_empty() || first.is_empty() {
        return None;
    }
    Some(format!("{}?{}", base, first))
}

/// Unique scan targets, in sorted order.
pub fn scan_targets<'a, I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    urls.into_iter().filter_map(canonicalize).collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_first_parameter() {
        assert_eq!(canonicalize("https://a.co/x?id=1&y=2").as_deref(), Some("https://a.co/x?id=1"));
        assert_eq!(canonicalize("https://a.co/x?id=1").as_deref(), Some("https://a.co/x?id=1"));
    }

    #[test]
    fn urls_without_query_are_dropped() {
        assert_eq!(canonicalize("https://a.co/x"), None);
        assert_eq!(canonicalize("https://a.co/x?"), None);
        assert_eq!(canonicalize("https://a.co/x?&y=2"), None);
    }

    #[test]
    fn shared_base_and_first_param_collapse() {
        let targets = scan_targets([
            "https://a.co/x?id=1&y=2",
            "https://a.co/x?id=1&z=3",
            "https://a.co/x?id=2",
            "https://a.co/static/page",
        ]);
        assert_eq!(targets, vec!["https://a.co/x?id=1", "https://a.co/x?id=2"]);
    }
}
