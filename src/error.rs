use thiserror::Error;

/// Errors raised by the recon pipeline.
///
/// `ToolUnavailable` and `Config` are detected before any domain starts and
/// end the whole run. `StageIo` aborts one domain. `ToolInvocation` is
/// skipped at the per-target level. `EmptyResult` stops a domain without
/// counting as a failure.
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("tool {tool} not found: {hint}")]
    ToolUnavailable { tool: String, hint: String },

    #[error("stage {stage} failed: {reason}")]
    StageIo { stage: &'static str, reason: String },

    #[error("{program} failed: {reason}")]
    ToolInvocation { program: String, reason: String },

    #[error("stage {stage} produced no records")]
    EmptyResult { stage: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReconError {
    pub fn stage_io(stage: &'static str, reason: impl std::fmt::Display) -> Self {
        ReconError::StageIo { stage, reason: reason.to_string() }
    }

    pub fn invocation(program: &str, reason: impl std::fmt::Display) -> Self {
        ReconError::ToolInvocation { program: program.to_string(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
