use once_cell::sync::Lazy;
use std::net::IpAddr;

/// A parsed CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    pub fn parse(s: &str) -> Option<Self> {
        let (addr, prefix) = match s.trim().split_once('/') {
            Some((a, p)) => (a.parse::<IpAddr>().ok()?, p.parse::<u8>().ok()?),
            None => {
                let a = s.trim().parse::<IpAddr>().ok()?;
                (a, if a.is_ipv4() { 32 } else { 128 })
            }
        };
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return None;
        }
        Some(Cidr { network: addr, prefix })
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = if self.prefix == 0 { 0 } else { u32::MAX << (32 - self.prefix) };
                (u32::from(net) & mask) == (u32::from(*ip) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = if self.prefix == 0 { 0 } else { u128::MAX << (128 - self.prefix) };
                (u128::from(net) & mask) == (u128::from(*ip) & mask)
            }
            _ => false,
        }
    }
}

/// Published edge ranges of the common CDN / WAF providers.
const BUILTIN_RANGES: &[(&str, &[&str])] = &[
    ("Cloudflare", &[
        "173.245.48.0/20", "103.21.244.0/22", "103.22.200.0/22", "103.31.4.0/22",
        "141.101.64.0/18", "108.162.192.0/18", "190.93.240.0/20", "188.114.96.0/20",
        "197.234.240.0/22", "198.41.128.0/17", "162.158.0.0/15", "104.16.0.0/13",
        "104.24.0.0/14", "172.64.0.0/13", "131.0.72.0/22",
        "2400:cb00::/32", "2606:4700::/32", "2803:f800::/32", "2405:b500::/32",
        "2405:8100::/32", "2a06:98c0::/29", "2c0f:f248::/32",
    ]),
    ("Fastly", &[
        "23.235.32.0/20", "43.249.72.0/22", "103.244.50.0/24", "103.245.222.0/23",
        "103.245.224.0/24", "104.156.80.0/20", "140.248.64.0/18", "140.248.128.0/17",
        "146.75.0.0/17", "151.101.0.0/16", "157.52.64.0/18", "167.82.0.0/17",
        "172.111.64.0/18", "185.31.16.0/22", "199.27.72.0/21", "199.232.0.0/16",
        "2a04:4e40::/32", "2a04:4e42::/32",
    ]),
    ("Akamai", &[
        "23.32.0.0/11", "23.192.0.0/11", "2.16.0.0/13", "104.64.0.0/10", "184.24.0.0/13",
        "95.100.0.0/15", "96.6.0.0/15", "184.50.0.0/15",
    ]),
    ("Amazon CloudFront", &[
        "13.32.0.0/15", "13.224.0.0/14", "52.84.0.0/15", "54.182.0.0/16", "54.192.0.0/16",
        "54.230.0.0/16", "54.239.128.0/18", "99.84.0.0/16", "205.251.192.0/19",
        "143.204.0.0/16", "18.64.0.0/14",
    ]),
    ("Imperva", &[
        "199.83.128.0/21", "198.143.32.0/19", "149.126.72.0/21", "103.28.248.0/22",
        "45.64.64.0/22", "185.11.124.0/22", "192.230.64.0/18", "107.154.0.0/16",
        "45.60.0.0/16", "45.223.0.0/16",
    ]),
    ("Sucuri", &["192.88.134.0/23", "185.93.228.0/22", "66.248.200.0/22", "208.109.0.0/22"]),
];

static BUILTIN: Lazy<Vec<(&'static str, Cidr)>> = Lazy::new(|| {
    BUILTIN_RANGES
        .iter()
        .flat_map(|(provider, ranges)| ranges.iter().filter_map(move |r| Cidr::parse(r).map(|c| (*provider, c))))
        .collect()
});

/// CDN membership test over the built-in table plus configured extras.
#[derive(Debug, Clone, Default)]
pub struct CdnRanges {
    extra: Vec<Cidr>,
}

impl CdnRanges {
    pub fn with_extra(extra: &[String]) -> Self {
        let extra = extra
            .iter()
            .filter_map(|r| {
                let parsed = Cidr::parse(r);
                if parsed.is_none() {
                    tracing::warn!(range = %r, "ignoring malformed cdn range");
                }
                parsed
            })
            .collect();
        Self { extra }
    }

    /// Provider name when `ip` sits inside a known CDN range.
    pub fn provider(&self, ip: &IpAddr) -> Option<&'static str> {
        if let Some((name, _)) = BUILTIN.iter().find(|(_, c)| c.contains(ip)) {
            return Some(*name);
        }
        self.extra.iter().any(|c| c.contains(ip)).then_some("custom")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn cidr_matching() {
        let c = Cidr::parse("104.16.0.0/13").unwrap();
        assert!(c.contains(&ip("104.23.255.1")));
        assert!(!c.contains(&ip("104.24.0.1")));
        assert!(!c.contains(&ip("2606:4700::1")));
        assert!(Cidr::parse("10.0.0.0/33").is_none());
        assert!(Cidr::parse("10.0.0.1").unwrap().contains(&ip("10.0.0.1")));
    }

    #[test]
    fn known_providers_are_detected() {
        let ranges = CdnRanges::default();
        assert_eq!(ranges.provider(&ip("104.16.1.1")), Some("Cloudflare"));
        assert_eq!(ranges.provider(&ip("151.101.1.69")), Some("Fastly"));
        assert_eq!(ranges.provider(&ip("2606:4700::6810:84e5")), Some("Cloudflare"));
        assert_eq!(ranges.provider(&ip("93.184.216.34")), None);
    }

    #[test]
    fn configured_ranges_extend_table() {
        let ranges = CdnRanges::with_extra(&["203.0.113.0/24".to_string(), "junk".to_string()]);
        assert_eq!(ranges.provider(&ip("203.0.113.7")), Some("custom"));
    }
}
