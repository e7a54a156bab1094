//! Evaluator and judge backend traits.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::EvalResult;

/// How an evaluator reaches its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    /// Pure computation (regex, lexical checks).
    Fast,
    /// Delegates to a generative judge; slower and possibly non-deterministic.
    Judged,
}

impl fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorKind::Fast => f.write_str("fast"),
            EvaluatorKind::Judged => f.write_str("judged"),
        }
    }
}

/// A named check over candidate text.
///
/// Implementations must not fail: backend or parse problems are reported as a
/// `FAIL` result so the loop can proceed uniformly.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Stable name carried on every result this evaluator produces.
    fn name(&self) -> &str;

    fn kind(&self) -> EvaluatorKind;

    async fn evaluate(&self, text: &str) -> EvalResult;
}

/// Failure to obtain a judgment from a [`JudgeBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct JudgeError(pub String);

/// Backend that answers a judge prompt with raw model output.
#[async_trait]
pub trait JudgeBackend: Send + Sync {
    async fn judge(&self, prompt: &str) -> Result<String, JudgeError>;
}
