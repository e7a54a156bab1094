//! copyloop core library
//!
//! Refine-and-evaluate loop for short product copy: a [`Generator`] drafts
//! text, an ordered set of [`Evaluator`]s judges it, and failures are folded
//! into one fix instruction per round until the text converges, the budget
//! runs out, or the same failure keeps coming back.

pub mod cancel;
pub mod config;
pub mod domain;
pub mod evaluator;
pub mod generator;
pub mod heuristics;
pub mod judge;
pub mod lint;
pub mod obs;
pub mod refine;
pub mod registry;
pub mod reporting;
pub mod rubric;
pub mod telemetry;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::{RefineConfig, DEFAULT_MAX_ITERS, DEFAULT_REPEAT_THRESHOLD};
pub use domain::{
    CopyloopError, EvalReport, EvalResult, EvalStatus, FinalStatus, IterationTrace,
    RefineOutcome, Reports, Result, Termination, ALL_PASS,
};
pub use evaluator::{Evaluator, EvaluatorKind, JudgeBackend, JudgeError};
pub use generator::{GenerationRequest, Generator};
pub use heuristics::{run_heuristics, ForbiddenWords, HeuristicsEvaluator, HeuristicsReport};
pub use judge::{ClarityJudge, EmpathyJudge, ToneJudge, DEFAULT_BRAND_VOICE};
pub use lint::{build_fix, lint_short_description, LintReport};
pub use refine::{consolidate_fixes, RefineLoop};
pub use registry::{EvaluatorContext, EvaluatorRegistry, EvaluatorSelection};
pub use reporting::{
    read_run_artifact, render_outcome_md, render_outcome_text, write_outcome_json,
    write_run_artifact,
};
pub use rubric::RubricEvaluator;
pub use telemetry::init_tracing;

/// Crate version, shared by every workspace member.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
