pub mod artifact_store;
pub mod report;

pub use artifact_store::{Artifact, ArtifactRef, ArtifactStore};
pub use report::{DomainReport, DomainStatus, ReportEmitter, RunSummary};
