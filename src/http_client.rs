use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client for liveness/status and header probes against recon targets.
pub fn create_probe_client(timeout_secs: u64) -> reqwest::Result<Client> {
    ClientBuilder::new()
        // Connection pooling - reuse connections across a domain's hosts
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_nodelay(true)

        // Timeouts
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(timeout_secs.clamp(1, 5)))

        .gzip(true)
        .brotli(true)
        .use_rustls_tls()

        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")

        // Targets routinely serve self-signed or mismatched certs (security research only)
        .danger_accept_invalid_certs(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(create_probe_client(10).is_ok());
        assert!(create_probe_client(0).is_ok());
    }
}
