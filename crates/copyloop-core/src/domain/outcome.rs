//! Refinement loop outcome and trace records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::eval::EvalReport;

/// Literal used for [`Reports::AllPass`] on the wire.
pub const ALL_PASS: &str = "ALL_PASS";

/// Caller-facing status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Success,
    Failure,
    Interrupted,
}

/// Terminal state the loop stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every evaluator passed the same candidate.
    Converged,
    /// The iteration budget ran out.
    Exhausted,
    /// One exact failure message reached the repeat threshold.
    LoopDetected,
    /// Cancelled by the user or operator.
    Interrupted,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::Success => "success",
            FinalStatus::Failure => "failure",
            FinalStatus::Interrupted => "interrupted",
        }
    }
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::Exhausted => "exhausted",
            Termination::LoopDetected => "loop_detected",
            Termination::Interrupted => "interrupted",
        }
    }

    pub fn final_status(&self) -> FinalStatus {
        match self {
            Termination::Converged => FinalStatus::Success,
            Termination::Exhausted | Termination::LoopDetected => FinalStatus::Failure,
            Termination::Interrupted => FinalStatus::Interrupted,
        }
    }
}

/// Either the `ALL_PASS` marker or the `(evaluator, error)` failures of the
/// final reported round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reports {
    AllPass,
    Failures(Vec<(String, String)>),
}

impl Reports {
    pub fn is_all_pass(&self) -> bool {
        matches!(self, Reports::AllPass)
    }

    /// Failure pairs; empty for [`Reports::AllPass`].
    pub fn failures(&self) -> &[(String, String)] {
        match self {
            Reports::AllPass => &[],
            Reports::Failures(failures) => failures,
        }
    }
}

impl Serialize for Reports {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reports::AllPass => serializer.serialize_str(ALL_PASS),
            Reports::Failures(failures) => failures.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Reports {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Marker(String),
            Failures(Vec<(String, String)>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Marker(marker) if marker == ALL_PASS => Ok(Reports::AllPass),
            Raw::Marker(other) => Err(serde::de::Error::custom(format!(
                "expected \"{ALL_PASS}\" or a list of failures, got \"{other}\""
            ))),
            Raw::Failures(failures) => Ok(Reports::Failures(failures)),
        }
    }
}

/// What happened in one evaluated round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationTrace {
    /// 1-based round number.
    pub iteration: u32,
    /// Every evaluator report recorded in the round, in registration order.
    pub reports: Vec<EvalReport>,
    /// Evaluators that passed this round, sorted.
    pub passing: Vec<String>,
    /// Fix instruction sent to the generator after the round, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

/// Result of one refinement loop invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineOutcome {
    pub run_id: Uuid,
    /// Final candidate text.
    pub text: String,
    pub reports: Reports,
    /// Rounds executed (0 only when interrupted before the first round).
    pub iterations: u32,
    pub final_status: FinalStatus,
    /// All reports of the last evaluated round.
    pub final_reports: Vec<EvalReport>,
    /// Why the run stopped early; set on loop detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub termination: Termination,
    pub trace: Vec<IterationTrace>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RefineOutcome {
    pub fn succeeded(&self) -> bool {
        self.final_status == FinalStatus::Success
    }
}
