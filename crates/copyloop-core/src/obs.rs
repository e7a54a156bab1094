//! Structured observability hooks for refinement runs.
//!
//! This module provides:
//! - Run-scoped tracing spans via [`refine_span`]
//! - Emission functions for the loop lifecycle: start, round evaluated, fix
//!   requested, generation failure, finish
//!
//! Events are emitted at `info!` level unless noted. For JSON output pass
//! `--log-json` to the CLI (see [`crate::telemetry::init_tracing`]).

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::Termination;

/// Span tagging every event of one run with its `run_id`.
///
/// The loop is async, so the span is attached with
/// `tracing::Instrument::instrument` rather than entered.
pub fn refine_span(run_id: &Uuid) -> tracing::Span {
    tracing::info_span!("copyloop.refine", run_id = %run_id)
}

/// Emit event: refinement run started.
pub fn emit_refine_started(run_id: &Uuid, evaluators: usize, max_iters: u32) {
    info!(
        event = "refine.started",
        run_id = %run_id,
        evaluators = evaluators,
        max_iters = max_iters,
    );
}

/// Emit event: one round of evaluation finished.
pub fn emit_iteration_evaluated(run_id: &Uuid, iteration: u32, failures: usize, passing: usize) {
    info!(
        event = "refine.iteration",
        run_id = %run_id,
        iteration = iteration,
        failures = failures,
        passing = passing,
    );
}

/// Emit event: the generator was asked for a revision.
pub fn emit_fix_requested(run_id: &Uuid, iteration: u32, failures: usize) {
    info!(
        event = "refine.fix_requested",
        run_id = %run_id,
        iteration = iteration,
        failures = failures,
    );
}

/// Emit event: the generator gave up (warning level).
pub fn emit_generation_failed(run_id: &Uuid, error: &dyn std::fmt::Display) {
    warn!(event = "refine.generation_failed", run_id = %run_id, error = %error);
}

/// Emit event: run reached a terminal state.
pub fn emit_refine_finished(
    run_id: &Uuid,
    termination: Termination,
    iterations: u32,
    duration_ms: u64,
) {
    info!(
        event = "refine.finished",
        run_id = %run_id,
        termination = ?termination,
        iterations = iterations,
        duration_ms = duration_ms,
    );
}
