use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Hostnames under `domain` in `raw`, one per line, lowercased. A line must be
/// a whole hostname; names are never cut out of the middle of a line.
pub fn hostnames_under(raw: &str, domain: &str) -> BTreeSet<String> {
    let pattern = format!(r"(?i)^[A-Za-z0-9_][A-Za-z0-9_.-]*\.{}$", regex::escape(domain));
    let Ok(re) = Regex::new(&pattern) else {
        return BTreeSet::new();
    };
    crate::utils::non_empty_lines(raw)
        .filter(|line| re.is_match(line))
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Hostnames found by the vhost probe that are not already known active subdomains.
pub fn new_vhost_subdomains(active: &[String], raw: &str, domain: &str) -> Vec<String> {
    let known: HashSet<String> = active.iter().map(|s| s.trim().to_ascii_lowercase()).collect();
    hostnames_under(raw, domain).into_iter().filter(|h| !known.contains(h)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unknown_hosts_are_new() {
        let active = vec!["a.x.com".to_string(), "b.x.com".to_string()];
        let raw = "a.x.com\nc.x.com\n";
        assert_eq!(new_vhost_subdomains(&active, raw, "x.com"), vec!["c.x.com"]);
    }

    #[test]
    fn ignores_other_domains_and_case() {
        let active = vec!["A.x.com".to_string()];
        let raw = "a.X.COM\ne.y.com\nx.com\nhost d.x.com status 200";
        assert_eq!(new_vhost_subdomains(&active, raw, "x.com"), Vec::<String>::new());
        assert_eq!(hostnames_under("deep.c.x.com", "x.com").into_iter().collect::<Vec<_>>(), vec!["deep.c.x.com"]);
    }

    #[test]
    fn underscore_words_stay_whole() {
        let active = vec!["a.x.com".to_string()];
        let raw = "_dmarc.x.com\nfoo_bar.x.com\n";
        assert_eq!(new_vhost_subdomains(&active, raw, "x.com"), vec!["_dmarc.x.com", "foo_bar.x.com"]);
    }
}
