use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use reqwest::Client;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ReconError, Result};

/// DNS and HTTP probes used by the liveness, IP, status and cache stages.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// A/AAAA addresses of `host`; empty when it does not resolve.
    async fn resolve(&self, host: &str) -> Vec<IpAddr>;

    /// Status of `GET https://host/`, falling back to plain http.
    async fn status(&self, host: &str) -> Option<u16>;

    /// Response headers of a HEAD request.
    async fn head(&self, url: &str) -> Result<BTreeMap<String, String>>;
}

pub struct LiveProbe {
    client: Client,
    resolver: TokioAsyncResolver,
}

impl LiveProbe {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = crate::http_client::create_probe_client(cfg.settings.timeout)
            .map_err(|e| ReconError::Config(format!("http client: {}", e)))?;
        Ok(Self { client, resolver: build_resolver(cfg) })
    }
}

fn build_resolver(cfg: &Config) -> TokioAsyncResolver {
    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(cfg.settings.timeout.clamp(1, 5));
    opts.attempts = 2;

    let custom = load_resolver_ips(&cfg.paths.resolvers);
    if !custom.is_empty() {
        tracing::debug!(count = custom.len(), "using configured resolvers");
        let group = NameServerConfigGroup::from_ips_clear(&custom, 53, true);
        return TokioAsyncResolver::tokio(ResolverConfig::from_parts(None, vec![], group), opts);
    }
    match TokioAsyncResolver::tokio_from_system_conf() {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "system resolver config unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
        }
    }
}

fn load_resolver_ips(path: &str) -> Vec<IpAddr> {
    if path.trim().is_empty() {
        return Vec::new();
    }
    match std::fs::read_to_string(path) {
        Ok(data) => crate::utils::non_empty_lines(&data).filter_map(|l| l.parse().ok()).collect(),
        Err(e) => {
            tracing::warn!(path, error = %e, "resolver list unreadable, falling back to system resolvers");
            Vec::new()
        }
    }
}

#[async_trait]
impl NetworkProbe for LiveProbe {
    async fn resolve(&self, host: &str) -> Vec<IpAddr> {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => {
                let mut ips: Vec<IpAddr> = lookup.iter().collect();
                ips.sort();
                ips.dedup();
                ips
            }
            Err(e) => {
                tracing::debug!(host, error = %e, "dns lookup failed");
                Vec::new()
            }
        }
    }

    async fn status(&self, host: &str) -> Option<u16> {
        for scheme in ["https", "http"] {
            match self.client.get(format!("{}://{}/", scheme, host)).send().await {
                Ok(resp) => return Some(resp.status().as_u16()),
                Err(e) => tracing::debug!(host, scheme, error = %e, "status probe failed"),
            }
        }
        None
    }

    async fn head(&self, url: &str) -> Result<BTreeMap<String, String>> {
        let resp = self.client.head(url).send().await.map_err(|e| ReconError::invocation("HEAD", e))?;
        Ok(header_map(resp.headers()))
    }
}

/// Flatten a header map; repeated headers are joined with ", ". Names come
/// out lowercase, as reqwest stores them.
pub fn header_map(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
        out.entry(name.as_str().to_string())
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, ETAG};

    #[test]
    fn header_map_joins_repeats() {
        let mut h = HeaderMap::new();
        h.append(CACHE_CONTROL, HeaderValue::from_static("public"));
        h.append(CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        h.insert(ETAG, HeaderValue::from_static("\"abc\""));
        let m = header_map(&h);
        assert_eq!(m.get("cache-control").map(String::as_str), Some("public, max-age=60"));
        assert_eq!(m.get("etag").map(String::as_str), Some("\"abc\""));
    }

    #[test]
    fn resolver_list_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolvers.txt");
        std::fs::write(&path, "1.1.1.1\nnot-an-ip\n\n8.8.8.8\n").unwrap();
        let ips = load_resolver_ips(path.to_str().unwrap());
        assert_eq!(ips.len(), 2);
        assert!(load_resolver_ips("").is_empty());
    }
}
