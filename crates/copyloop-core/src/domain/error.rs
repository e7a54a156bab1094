//! Error taxonomy for copyloop.
//!
//! Only setup failures, fatal generator failures and artifact I/O are errors.
//! Loop-detected, exhausted and interrupted runs are ordinary outcomes, see
//! [`crate::domain::Termination`].

/// copyloop errors.
#[derive(Debug, thiserror::Error)]
pub enum CopyloopError {
    #[error("unknown evaluator: {name} (available: {})", available.join(", "))]
    UnknownEvaluator {
        name: String,
        available: Vec<String>,
    },

    #[error("evaluator {name} needs a judge backend but none is configured")]
    JudgeUnavailable { name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("invalid run id: {0}")]
    InvalidRunId(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for copyloop operations.
pub type Result<T> = std::result::Result<T, CopyloopError>;
