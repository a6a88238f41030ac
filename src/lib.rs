pub mod analyze;
pub mod config;
pub mod dedup;
pub mod error;
pub mod external;
pub mod filter;
pub mod http_client;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod scheduler;
pub mod utils;

// re-export modules used in tests
pub use crate::error::{ReconError, Result};
pub use crate::options::{Features, Options};
pub use crate::pipeline::StagePipeline;
pub use crate::scheduler::{DomainOutcome, Scheduler};
