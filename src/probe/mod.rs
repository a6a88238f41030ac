pub mod cdn;
pub mod network;

pub use cdn::CdnRanges;
pub use network::{LiveProbe, NetworkProbe};
