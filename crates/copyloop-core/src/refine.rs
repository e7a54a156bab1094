//! The refine-and-evaluate loop.
//!
//! One invocation runs `generate → evaluate all → consolidate failures →
//! revise` rounds until every evaluator passes (`Converged`), one exact
//! failure message reaches the repeat threshold (`LoopDetected`), the
//! iteration budget runs out (`Exhausted`), or the caller cancels
//! (`Interrupted`). All loop state lives in `LoopState` and is dropped with
//! the invocation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::config::RefineConfig;
use crate::domain::{
    EvalReport, EvalResult, IterationTrace, RefineOutcome, Reports, Result, Termination,
};
use crate::evaluator::Evaluator;
use crate::generator::{GenerationRequest, Generator};
use crate::obs;

/// Join failures into one fix instruction: `"<name>: <error>"` per line, in
/// the order the failures were recorded.
pub fn consolidate_fixes(failures: &[EvalResult]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.error))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Refinement loop bound to one generator, an ordered evaluator list and a
/// policy. Cheap to share; each [`RefineLoop::run`] call owns its own state.
pub struct RefineLoop {
    generator: Arc<dyn Generator>,
    evaluators: Vec<Arc<dyn Evaluator>>,
    config: RefineConfig,
}

impl RefineLoop {
    pub fn new(
        generator: Arc<dyn Generator>,
        evaluators: Vec<Arc<dyn Evaluator>>,
        config: RefineConfig,
    ) -> Self {
        Self {
            generator,
            evaluators,
            config,
        }
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    pub fn evaluator_names(&self) -> Vec<&str> {
        self.evaluators.iter().map(|e| e.name()).collect()
    }

    /// Run to a terminal state without external cancellation.
    pub async fn run(&self, scenario: &str, style: &str) -> Result<RefineOutcome> {
        self.run_with_cancel(scenario, style, &CancelSignal::never())
            .await
    }

    /// Run to a terminal state, stopping cleanly if `cancel` fires.
    ///
    /// Returns `Err` only for an invalid policy or a generator failure; every
    /// other ending is an `Ok` outcome carrying its [`Termination`].
    pub async fn run_with_cancel(
        &self,
        scenario: &str,
        style: &str,
        cancel: &CancelSignal,
    ) -> Result<RefineOutcome> {
        self.config.validate()?;

        let state = LoopState::new();
        let span = obs::refine_span(&state.run_id);
        self.drive(state, scenario, style, cancel)
            .instrument(span)
            .await
    }

    async fn drive(
        &self,
        mut state: LoopState,
        scenario: &str,
        style: &str,
        cancel: &CancelSignal,
    ) -> Result<RefineOutcome> {
        obs::emit_refine_started(&state.run_id, self.evaluators.len(), self.config.max_iters);
        info!("Starting refinement for scenario: {}", scenario);
        debug!(style = %style, evaluators = ?self.evaluator_names(), "refine setup");

        let initial = GenerationRequest::initial(scenario, style);
        match cancel
            .run_until_cancelled(self.generator.generate(&initial))
            .await
        {
            None => return Ok(state.finish(Termination::Interrupted, None)),
            Some(generated) => state.text = self.generated(&state, generated)?,
        }
        debug!("Generated initial text");

        for iteration in 1..=self.config.max_iters {
            state.begin_iteration(iteration);
            info!("Iteration {}/{}", iteration, self.config.max_iters);

            for evaluator in &self.evaluators {
                let evaluated = cancel
                    .run_until_cancelled(evaluator.evaluate(&state.text))
                    .await;
                let Some(result) = evaluated else {
                    warn!("Refinement interrupted during {}", evaluator.name());
                    return Ok(state.finish(Termination::Interrupted, None));
                };

                state.reports.push(result.to_report());

                if result.passed() {
                    debug!("{} passed", result.name);
                    state.passing.insert(result.name);
                    continue;
                }

                debug!("{} failed: {}", result.name, result.error);
                let seen = state.record_failure(result);
                if seen.count >= self.config.repeat_threshold {
                    warn!(
                        "Error message repeated {} times, giving up: {}",
                        seen.count, seen.message
                    );
                    let reason = format!(
                        "Max retries ({}) exceeded for error: {}",
                        self.config.repeat_threshold, seen.message
                    );
                    return Ok(state.finish(Termination::LoopDetected, Some(reason)));
                }
            }

            obs::emit_iteration_evaluated(
                &state.run_id,
                iteration,
                state.failures.len(),
                state.passing.len(),
            );

            if state.failures.is_empty() {
                info!("All evaluators passed");
                return Ok(state.finish(Termination::Converged, None));
            }

            // The last failing round still gets a revision; an exhausted run
            // returns that newest text alongside the failures it addressed.
            let fix = consolidate_fixes(&state.failures);
            info!("Found {} issue(s) to fix", state.failures.len());
            obs::emit_fix_requested(&state.run_id, iteration, state.failures.len());
            state.close_iteration(Some(fix.clone()));

            let request = GenerationRequest::revision(scenario, style, state.text.clone(), fix);
            match cancel
                .run_until_cancelled(self.generator.generate(&request))
                .await
            {
                None => return Ok(state.finish(Termination::Interrupted, None)),
                Some(generated) => state.text = self.generated(&state, generated)?,
            }
            debug!("Generated revised text");
        }

        warn!("Hit maximum iterations ({})", self.config.max_iters);
        Ok(state.finish(Termination::Exhausted, None))
    }

    fn generated(&self, state: &LoopState, generated: Result<String>) -> Result<String> {
        generated.map_err(|e| {
            obs::emit_generation_failed(&state.run_id, &e);
            e
        })
    }
}

/// A failure message and how often it has been seen this run.
struct SeenFailure {
    message: String,
    count: u32,
}

/// State owned by one loop invocation.
struct LoopState {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    clock: Instant,
    text: String,
    iteration: u32,
    passing: BTreeSet<String>,
    error_counts: HashMap<String, u32>,
    failures: Vec<EvalResult>,
    reports: Vec<EvalReport>,
    trace: Vec<IterationTrace>,
    round_open: bool,
}

impl LoopState {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            clock: Instant::now(),
            text: String::new(),
            iteration: 0,
            passing: BTreeSet::new(),
            error_counts: HashMap::new(),
            failures: Vec::new(),
            reports: Vec::new(),
            trace: Vec::new(),
            round_open: false,
        }
    }

    fn begin_iteration(&mut self, iteration: u32) {
        self.iteration = iteration;
        if iteration > 1 {
            self.passing.clear();
        }
        self.failures.clear();
        self.reports.clear();
        self.round_open = true;
    }

    fn record_failure(&mut self, result: EvalResult) -> SeenFailure {
        let count = self.error_counts.entry(result.error.clone()).or_insert(0);
        *count += 1;
        let seen = SeenFailure {
            message: result.error.clone(),
            count: *count,
        };
        self.failures.push(result);
        seen
    }

    fn close_iteration(&mut self, fix: Option<String>) {
        if !self.round_open {
            return;
        }
        self.trace.push(IterationTrace {
            iteration: self.iteration,
            reports: self.reports.clone(),
            passing: self.passing.iter().cloned().collect(),
            fix,
        });
        self.round_open = false;
    }

    fn finish(mut self, termination: Termination, reason: Option<String>) -> RefineOutcome {
        self.close_iteration(None);

        let reports = match termination {
            Termination::Converged => Reports::AllPass,
            _ => Reports::Failures(
                self.failures
                    .iter()
                    .map(|f| (f.name.clone(), f.error.clone()))
                    .collect(),
            ),
        };

        obs::emit_refine_finished(
            &self.run_id,
            termination,
            self.iteration,
            self.clock.elapsed().as_millis() as u64,
        );

        RefineOutcome {
            run_id: self.run_id,
            text: self.text,
            reports,
            iterations: self.iteration,
            final_status: termination.final_status(),
            final_reports: self.reports,
            reason,
            termination,
            trace: self.trace,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
