//! Error types for the chat backend.

use thiserror::Error;

use copyloop_core::CopyloopError;

/// Errors talking to an OpenAI-compatible endpoint.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key configured
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    /// Connection or timeout failure before a status was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request could not be built or sent for a non-network reason
    #[error("request error: {0}")]
    Request(String),

    /// Non-success HTTP status
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Reply had no usable message content
    #[error("API returned an empty response")]
    EmptyResponse,

    /// Reply body was not the expected JSON
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            LlmError::Http(err.to_string())
        } else {
            LlmError::Request(err.to_string())
        }
    }
}

impl From<LlmError> for CopyloopError {
    fn from(err: LlmError) -> Self {
        CopyloopError::Generation(err.to_string())
    }
}
