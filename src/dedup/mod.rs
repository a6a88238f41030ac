pub mod ffuf;
pub mod js_paths;
pub mod sqli;
pub mod vhost;

pub use js_paths::{fuzz_targets, js_prefix, FuzzTarget};
pub use sqli::{canonicalize, scan_targets};
pub use vhost::new_vhost_subdomains;
