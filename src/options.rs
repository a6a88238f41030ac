use std::path::PathBuf;

use crate::config::Config;

/// Optional stages switched on from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub vhost: bool,
    pub smart_fuzz: bool,
    pub sqli: bool,
    pub nuclei: bool,
    pub js_fuzz: bool,
    pub wcd: bool,
}

/// Read-only run configuration shared by every domain job.
#[derive(Debug, Clone)]
pub struct Options {
    pub features: Features,
    pub concurrency: usize,
    pub output_base: PathBuf,
    pub config: Config,
}

impl Options {
    pub fn new(features: Features, concurrency: usize, output_base: PathBuf, config: Config) -> Self {
        Self { features, concurrency: concurrency.max(1), output_base, config }
    }

    /// `<base>/recon_<domain>`
    pub fn domain_dir(&self, domain: &str) -> PathBuf {
        self.output_base.join(format!("recon_{}", domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_dir_and_concurrency_floor() {
        let opts = Options::new(Features::default(), 0, PathBuf::from("/tmp/out"), Config::default());
        assert_eq!(opts.concurrency, 1);
        assert_eq!(opts.domain_dir("example.com"), PathBuf::from("/tmp/out/recon_example.com"));
    }
}
