//! Behavioural tests for the refinement loop using scripted generators and
//! evaluators.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use copyloop_core::{
    cancel_pair, CopyloopError, EvalResult, Evaluator, EvaluatorKind, FinalStatus,
    GenerationRequest, Generator, RefineConfig, RefineLoop, Reports, Result, Termination,
};

/// Returns the scenario verbatim for a first draft and appends `" (fixed)"`
/// to the previous text for a revision. Records every request.
#[derive(Default)]
struct EchoGenerator {
    requests: Mutex<Vec<GenerationRequest>>,
}

impl EchoGenerator {
    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn fixes(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.fix.clone())
            .collect()
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(match (&request.previous, &request.fix) {
            (Some(previous), Some(_)) => format!("{previous} (fixed)"),
            _ => request.scenario.clone(),
        })
    }
}

struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(CopyloopError::Generation("backend unavailable".to_string()))
    }
}

/// Never finishes; used to observe cancellation of an in-flight call.
struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        std::future::pending().await
    }
}

/// Answers the first draft, then never finishes a revision.
#[derive(Default)]
struct StallsOnRevision {
    calls: AtomicU32,
}

#[async_trait]
impl Generator for StallsOnRevision {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.is_revision() {
            std::future::pending::<()>().await;
        }
        Ok(request.scenario.clone())
    }
}

/// Evaluator scripted by call number (1-based).
struct Scripted {
    name: &'static str,
    calls: AtomicU32,
    script: Box<dyn Fn(u32, &str) -> Option<String> + Send + Sync>,
}

impl Scripted {
    fn new(
        name: &'static str,
        script: impl Fn(u32, &str) -> Option<String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicU32::new(0),
            script: Box::new(script),
        })
    }

    fn always_pass(name: &'static str) -> Arc<Self> {
        Self::new(name, |_, _| None)
    }

    fn always_fail(name: &'static str, message: &'static str) -> Arc<Self> {
        Self::new(name, move |_, _| Some(message.to_string()))
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Fast
    }

    async fn evaluate(&self, text: &str) -> EvalResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match (self.script)(call, text) {
            None => EvalResult::pass(self.name),
            Some(error) => EvalResult::fail(self.name, error),
        }
    }
}

fn config(max_iters: u32) -> RefineConfig {
    RefineConfig::default().with_max_iters(max_iters)
}

#[tokio::test]
async fn all_passing_converges_on_first_round() {
    let generator = Arc::new(EchoGenerator::default());
    let refine = RefineLoop::new(
        generator.clone(),
        vec![Scripted::always_pass("a"), Scripted::always_pass("b")],
        config(5),
    );

    let outcome = refine.run("Card declined", "friendly").await.unwrap();

    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.final_status, FinalStatus::Success);
    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(outcome.reports, Reports::AllPass);
    assert_eq!(outcome.text, "Card declined");
    assert_eq!(outcome.final_reports.len(), 2);
    assert!(outcome.reason.is_none());
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn one_fix_round_then_converges() {
    let generator = Arc::new(EchoGenerator::default());
    let flaky = Scripted::new("first", |call, _| {
        (call == 1).then(|| "Test error".to_string())
    });
    let refine = RefineLoop::new(
        generator.clone(),
        vec![flaky, Scripted::always_pass("second")],
        config(5),
    );

    let outcome = refine.run("Session expired", "calm").await.unwrap();

    assert!(outcome.text.ends_with(" (fixed)"));
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.final_status, FinalStatus::Success);
    assert_eq!(generator.fixes(), vec!["first: Test error".to_string()]);

    let requests = generator.requests.lock().unwrap();
    assert!(!requests[0].is_revision());
    assert!(requests[1].is_revision());
    assert_eq!(requests[1].previous.as_deref(), Some("Session expired"));
    assert_eq!(requests[1].style, "calm");
}

#[tokio::test]
async fn budget_exhausts_before_loop_detection() {
    let generator = Arc::new(EchoGenerator::default());
    let refine = RefineLoop::new(
        generator.clone(),
        vec![Scripted::always_fail("only", "Always fails")],
        config(2),
    );

    let outcome = refine.run("Upload failed", "plain").await.unwrap();

    assert_eq!(outcome.final_status, FinalStatus::Failure);
    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(
        outcome.reports,
        Reports::Failures(vec![("only".to_string(), "Always fails".to_string())])
    );
    // The last failing round still triggers a revision.
    assert_eq!(generator.calls(), 3);
    assert_eq!(outcome.text, "Upload failed (fixed) (fixed)");
    assert_eq!(outcome.trace.len(), 2);
    assert_eq!(outcome.trace[1].fix.as_deref(), Some("only: Always fails"));
}

#[tokio::test]
async fn repeated_failure_stops_early() {
    let generator = Arc::new(EchoGenerator::default());
    let refine = RefineLoop::new(
        generator.clone(),
        vec![Scripted::always_fail("stubborn", "Same message")],
        config(10),
    );

    let outcome = refine.run("Quota exceeded", "plain").await.unwrap();

    assert_eq!(outcome.final_status, FinalStatus::Failure);
    assert_eq!(outcome.termination, Termination::LoopDetected);
    assert_eq!(outcome.iterations, 3);
    let reason = outcome.reason.expect("loop detection gives a reason");
    assert!(reason.contains("Same message"));
    assert!(reason.contains('3'));
    assert_eq!(generator.calls(), 3);
}

#[tokio::test]
async fn repeat_count_spans_non_consecutive_rounds() {
    // Fails with "X" on rounds 1, 3 and 5; something else in between.
    let evaluator = Scripted::new("wobbly", |call, _| {
        Some(if call % 2 == 1 { "X" } else { "Y" }.to_string())
    });
    let refine = RefineLoop::new(
        Arc::new(EchoGenerator::default()),
        vec![evaluator],
        config(10),
    );

    let outcome = refine.run("s", "t").await.unwrap();

    assert_eq!(outcome.termination, Termination::LoopDetected);
    assert_eq!(outcome.iterations, 5);
    assert!(outcome.reason.unwrap().contains("X"));
}

#[tokio::test]
async fn loop_detection_mid_round_skips_remaining_evaluators() {
    let late = Scripted::always_pass("late");
    let refine = RefineLoop::new(
        Arc::new(EchoGenerator::default()),
        vec![Scripted::always_fail("early", "nope"), late.clone()],
        config(10).with_repeat_threshold(2),
    );

    let outcome = refine.run("s", "t").await.unwrap();

    assert_eq!(outcome.termination, Termination::LoopDetected);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(late.calls(), 1);
    assert_eq!(outcome.final_reports.len(), 1);
    assert_eq!(outcome.final_reports[0].name, "early");
}

#[tokio::test]
async fn no_evaluators_converges_immediately() {
    let generator = Arc::new(EchoGenerator::default());
    let refine = RefineLoop::new(generator.clone(), Vec::new(), config(7));

    let outcome = refine.run("Anything", "any").await.unwrap();

    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.termination, Termination::Converged);
    assert_eq!(outcome.reports, Reports::AllPass);
    assert!(outcome.final_reports.is_empty());
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn simultaneous_failures_share_one_revision() {
    let generator = Arc::new(EchoGenerator::default());
    let tone = Scripted::new("tone", |call, _| (call == 1).then(|| "Too curt".to_string()));
    let clarity = Scripted::new("clarity", |call, _| {
        (call == 1).then(|| "No next step".to_string())
    });
    let refine = RefineLoop::new(generator.clone(), vec![tone, clarity], config(5));

    let outcome = refine.run("Payment failed", "warm").await.unwrap();

    assert_eq!(outcome.iterations, 2);
    assert_eq!(generator.calls(), 2);
    assert_eq!(
        generator.fixes(),
        vec!["tone: Too curt\nclarity: No next step".to_string()]
    );
}

#[tokio::test]
async fn every_evaluator_runs_every_round() {
    let steady = Scripted::always_pass("steady");
    let picky = Scripted::new("picky", |call, _| (call < 3).then(|| format!("try {call}")));
    let refine = RefineLoop::new(
        Arc::new(EchoGenerator::default()),
        vec![steady.clone(), picky],
        config(5),
    );

    let outcome = refine.run("s", "t").await.unwrap();

    assert_eq!(outcome.iterations, 3);
    assert_eq!(steady.calls(), 3);
    assert_eq!(outcome.trace.len(), 3);
    assert_eq!(outcome.trace[0].fix.as_deref(), Some("picky: try 1"));
    assert_eq!(outcome.trace[2].fix, None);
    assert_eq!(outcome.trace[2].passing, vec!["picky", "steady"]);
}

#[tokio::test]
async fn iterations_never_exceed_budget() {
    for max_iters in 1..=4 {
        let generator = Arc::new(EchoGenerator::default());
        let counter = AtomicU32::new(0);
        let unique = Scripted::new("unique", move |_, _| {
            Some(format!("failure {}", counter.fetch_add(1, Ordering::SeqCst)))
        });
        let refine = RefineLoop::new(generator.clone(), vec![unique], config(max_iters));

        let outcome = refine.run("s", "t").await.unwrap();

        assert_eq!(outcome.termination, Termination::Exhausted);
        assert!(outcome.iterations >= 1 && outcome.iterations <= max_iters);
        assert_eq!(generator.calls() as u32, max_iters + 1);
    }
}

#[tokio::test]
async fn generator_error_propagates() {
    let refine = RefineLoop::new(
        Arc::new(FailingGenerator),
        vec![Scripted::always_pass("a")],
        config(3),
    );

    let err = refine.run("s", "t").await.unwrap_err();
    assert!(matches!(err, CopyloopError::Generation(_)));
}

#[tokio::test]
async fn invalid_config_rejected_before_generation() {
    let generator = Arc::new(EchoGenerator::default());
    let refine = RefineLoop::new(generator.clone(), Vec::new(), config(0));

    let err = refine.run("s", "t").await.unwrap_err();
    assert!(matches!(err, CopyloopError::InvalidConfig(_)));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn cancelled_before_start_is_interrupted_and_empty() {
    let generator = Arc::new(EchoGenerator::default());
    let refine = RefineLoop::new(generator.clone(), vec![Scripted::always_pass("a")], config(3));
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let outcome = refine.run_with_cancel("s", "t", &signal).await.unwrap();

    assert_eq!(outcome.final_status, FinalStatus::Interrupted);
    assert_eq!(outcome.iterations, 0);
    assert!(outcome.text.is_empty());
    assert_eq!(outcome.reports, Reports::Failures(Vec::new()));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_generation_abandons_call() {
    let refine = Arc::new(RefineLoop::new(
        Arc::new(StalledGenerator),
        vec![Scripted::always_pass("a")],
        config(3),
    ));
    let (handle, signal) = cancel_pair();

    let task = {
        let refine = refine.clone();
        tokio::spawn(async move { refine.run_with_cancel("s", "t", &signal).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.termination, Termination::Interrupted);
    assert_eq!(outcome.iterations, 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_revision_keeps_first_draft_and_failures() {
    let generator = Arc::new(StallsOnRevision::default());
    let refine = Arc::new(RefineLoop::new(
        generator.clone(),
        vec![
            Scripted::always_pass("rubric"),
            Scripted::always_fail("tone", "Too curt"),
        ],
        config(3),
    ));
    let (handle, signal) = cancel_pair();

    let task = {
        let refine = refine.clone();
        tokio::spawn(async move { refine.run_with_cancel("Card declined", "t", &signal).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    handle.cancel();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.termination, Termination::Interrupted);
    assert_eq!(outcome.final_status, FinalStatus::Interrupted);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.text, "Card declined");
    assert_eq!(
        outcome.reports,
        Reports::Failures(vec![("tone".to_string(), "Too curt".to_string())])
    );
    assert_eq!(outcome.final_reports.len(), 2);
    assert_eq!(outcome.trace.len(), 1);
    assert_eq!(outcome.trace[0].fix.as_deref(), Some("tone: Too curt"));
}

#[tokio::test]
async fn cancel_mid_round_keeps_partial_reports() {
    let (handle, signal) = cancel_pair();
    let handle = Arc::new(handle);
    let trigger = {
        let handle = handle.clone();
        Scripted::new("trigger", move |_, _| {
            handle.cancel();
            Some("bad".to_string())
        })
    };
    let never_reached = Scripted::always_pass("never");
    let refine = RefineLoop::new(
        Arc::new(EchoGenerator::default()),
        vec![trigger, never_reached.clone()],
        config(3),
    );

    let outcome = refine.run_with_cancel("draft", "t", &signal).await.unwrap();

    assert_eq!(outcome.final_status, FinalStatus::Interrupted);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.text, "draft");
    assert_eq!(
        outcome.reports,
        Reports::Failures(vec![("trigger".to_string(), "bad".to_string())])
    );
    assert_eq!(outcome.final_reports.len(), 1);
    assert_eq!(never_reached.calls(), 0);
}

#[tokio::test]
async fn concurrent_runs_do_not_share_counts() {
    let refine = Arc::new(RefineLoop::new(
        Arc::new(EchoGenerator::default()),
        vec![Scripted::always_fail("f", "same")],
        config(10),
    ));

    let a = tokio::spawn({
        let refine = refine.clone();
        async move { refine.run("a", "t").await }
    });
    let b = tokio::spawn({
        let refine = refine.clone();
        async move { refine.run("b", "t").await }
    });

    for outcome in [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()] {
        assert_eq!(outcome.termination, Termination::LoopDetected);
        assert_eq!(outcome.iterations, 3);
    }
}

#[tokio::test]
async fn outcome_serializes_all_pass_marker() {
    let refine = RefineLoop::new(Arc::new(EchoGenerator::default()), Vec::new(), config(1));
    let outcome = refine.run("s", "t").await.unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["reports"], "ALL_PASS");
    assert_eq!(json["final_status"], "success");
    assert_eq!(json["termination"], "converged");
}
