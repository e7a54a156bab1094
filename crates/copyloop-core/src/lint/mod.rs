//! Static linters over generated copy.
//!
//! - [`short_description`]: one-line summary rules
//! - [`fixes`]: turn lint and heuristic messages into instructions a
//!   generator can act on

pub mod fixes;
pub mod short_description;

use serde::Serialize;

use crate::domain::EvalStatus;

/// Outcome of a lint pass. `errors` is empty exactly when `status` is `Pass`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub status: EvalStatus,
    pub errors: Vec<String>,
}

impl LintReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        let status = if errors.is_empty() {
            EvalStatus::Pass
        } else {
            EvalStatus::Fail
        };
        Self { status, errors }
    }

    pub fn passed(&self) -> bool {
        self.status == EvalStatus::Pass
    }
}

pub use fixes::{build_fix, fix_template};
pub use short_description::{lint_short_description, MAX_CHARS};
