//! Evaluator selection and construction.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use copyloop_core::{
    CopyloopError, EvaluatorContext, EvaluatorKind, EvaluatorRegistry, EvaluatorSelection,
    JudgeBackend, JudgeError,
};

struct StaticJudge(&'static str);

#[async_trait]
impl JudgeBackend for StaticJudge {
    async fn judge(&self, _prompt: &str) -> Result<String, JudgeError> {
        Ok(self.0.to_string())
    }
}

fn judged_context() -> EvaluatorContext {
    EvaluatorContext::default().with_judge(Arc::new(StaticJudge(
        r#"{"empathetic": true, "suggestion": ""}"#,
    )))
}

fn names(selection: EvaluatorSelection, ctx: &EvaluatorContext) -> Vec<String> {
    EvaluatorRegistry::builtin()
        .resolve(&selection, ctx)
        .unwrap()
        .iter()
        .map(|e| e.name().to_string())
        .collect()
}

#[test]
fn default_selection_is_fast_plus_clarity() {
    assert_eq!(
        names(EvaluatorSelection::Default, &judged_context()),
        vec!["heuristics", "rubric", "clarity"]
    );
}

#[test]
fn fast_only_needs_no_judge() {
    let ctx = EvaluatorContext::default();
    let resolved = EvaluatorRegistry::builtin()
        .resolve(&EvaluatorSelection::FastOnly, &ctx)
        .unwrap();
    assert_eq!(resolved.len(), 2);
    assert!(resolved.iter().all(|e| e.kind() == EvaluatorKind::Fast));
}

#[test]
fn none_selection_is_empty() {
    assert!(names(EvaluatorSelection::None, &EvaluatorContext::default()).is_empty());
}

#[test]
fn named_selection_keeps_order_and_duplicates() {
    let selection = EvaluatorSelection::Named(vec![
        "tone".to_string(),
        "rubric".to_string(),
        "tone".to_string(),
    ]);
    assert_eq!(
        names(selection, &judged_context()),
        vec!["tone", "rubric", "tone"]
    );
}

#[test]
fn unknown_name_lists_available() {
    let selection = EvaluatorSelection::Named(vec!["rubric".to_string(), "spelling".to_string()]);
    let err = EvaluatorRegistry::builtin()
        .resolve(&selection, &judged_context())
        .err()
        .expect("unknown evaluator must fail");

    match err {
        CopyloopError::UnknownEvaluator { name, available } => {
            assert_eq!(name, "spelling");
            assert_eq!(
                available,
                vec!["heuristics", "rubric", "clarity", "empathy", "tone"]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn judged_evaluator_without_backend_fails_at_setup() {
    let err = EvaluatorRegistry::builtin()
        .resolve(&EvaluatorSelection::Default, &EvaluatorContext::default())
        .err()
        .expect("clarity without a judge must fail");
    assert!(matches!(err, CopyloopError::JudgeUnavailable { ref name } if name == "clarity"));
}

#[test]
fn unreadable_forbidden_file_is_io_error() {
    let ctx = EvaluatorContext::default().with_forbidden_file("/nonexistent/copyloop/words.txt");
    let err = EvaluatorRegistry::builtin()
        .resolve(&EvaluatorSelection::FastOnly, &ctx)
        .err()
        .expect("missing word list must fail");
    assert!(matches!(err, CopyloopError::Io(_)));
}

#[tokio::test]
async fn custom_forbidden_file_is_used() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# house style\nsynergy").unwrap();

    let ctx = EvaluatorContext::default().with_forbidden_file(file.path());
    let evaluators = EvaluatorRegistry::builtin()
        .resolve(
            &EvaluatorSelection::Named(vec!["heuristics".to_string()]),
            &ctx,
        )
        .unwrap();

    let result = evaluators[0].evaluate("Our synergy plan is ready.").await;
    assert!(!result.passed());
    assert_eq!(result.error, "forbidden word: synergy");

    // The built-in list is replaced, not extended.
    let result = evaluators[0].evaluate("Please try again.").await;
    assert!(result.passed());
}

#[tokio::test]
async fn judged_evaluator_uses_backend() {
    let evaluators = EvaluatorRegistry::builtin()
        .resolve(
            &EvaluatorSelection::Named(vec!["empathy".to_string()]),
            &judged_context(),
        )
        .unwrap();
    assert!(evaluators[0].evaluate("We could not save your changes.").await.passed());
}
