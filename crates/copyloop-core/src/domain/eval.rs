//! Evaluator result model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message used when a FAIL is built without an explanation.
const UNSPECIFIED_FAILURE: &str = "unspecified failure";

/// Verdict of a single evaluator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvalStatus {
    Pass,
    Fail,
}

impl EvalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalStatus::Pass => "PASS",
            EvalStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for EvalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one evaluator run against one candidate text.
///
/// # Invariants
///
/// A `PASS` result carries an empty `error`; a `FAIL` result carries a
/// non-empty one. The loop keys loop detection on the exact `error` string,
/// so evaluators should keep their messages stable for the same problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Name of the evaluator that produced this result.
    pub name: String,
    pub status: EvalStatus,
    /// Explanation of the failure; empty on `PASS`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl EvalResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: EvalStatus::Pass,
            error: String::new(),
        }
    }

    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = UNSPECIFIED_FAILURE.to_string();
        }
        Self {
            name: name.into(),
            status: EvalStatus::Fail,
            error,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == EvalStatus::Pass
    }

    /// The per-round report record for this result.
    pub fn to_report(&self) -> EvalReport {
        EvalReport {
            name: self.name.clone(),
            status: self.status,
            details: if self.passed() {
                "Pass".to_string()
            } else {
                self.error.clone()
            },
        }
    }
}

/// Report record kept for every evaluator invocation within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalReport {
    pub name: String,
    pub status: EvalStatus,
    /// The failure explanation, or `"Pass"`.
    pub details: String,
}
