//! Generator contract consumed by the refinement loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Result;

/// Inputs for one draft or revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub scenario: String,
    pub style: String,
    /// Previous candidate; `None` for the first draft.
    pub previous: Option<String>,
    /// Consolidated fix instruction; `None` for the first draft.
    pub fix: Option<String>,
}

impl GenerationRequest {
    /// Request for the first draft.
    pub fn initial(scenario: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            style: style.into(),
            previous: None,
            fix: None,
        }
    }

    /// Request for a revision of `previous` that addresses `fix`.
    pub fn revision(
        scenario: impl Into<String>,
        style: impl Into<String>,
        previous: impl Into<String>,
        fix: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            style: style.into(),
            previous: Some(previous.into()),
            fix: Some(fix.into()),
        }
    }

    pub fn is_revision(&self) -> bool {
        self.previous.is_some() && self.fix.is_some()
    }
}

/// Produces or revises candidate text.
///
/// Implementations retry their own transient failures and return
/// [`crate::CopyloopError::Generation`] only once those retries are spent.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
