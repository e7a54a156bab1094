//! Domain models for copyloop.
//!
//! - `EvalResult` / `EvalReport`: what an evaluator says about a candidate
//! - `RefineOutcome`: what the refinement loop hands back to its caller
//! - `CopyloopError`: setup, generation and artifact failures

pub mod error;
pub mod eval;
pub mod outcome;

pub use error::{CopyloopError, Result};
pub use eval::{EvalReport, EvalResult, EvalStatus};
pub use outcome::{FinalStatus, IterationTrace, RefineOutcome, Reports, Termination, ALL_PASS};
