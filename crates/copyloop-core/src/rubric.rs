//! Structural minimums every candidate must meet.

use async_trait::async_trait;

use crate::domain::EvalResult;
use crate::evaluator::{Evaluator, EvaluatorKind};

/// Returns the first rubric violation, if any.
pub fn check_rubric(text: &str) -> Option<&'static str> {
    if text.trim().is_empty() {
        return Some("text is empty");
    }
    if text.lines().any(is_markdown_heading) {
        return Some("text contains a Markdown heading");
    }
    None
}

fn is_markdown_heading(line: &str) -> bool {
    let line = line.trim_start();
    let hashes = line.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

pub struct RubricEvaluator;

impl RubricEvaluator {
    pub const NAME: &'static str = "rubric";
}

#[async_trait]
impl Evaluator for RubricEvaluator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Fast
    }

    async fn evaluate(&self, text: &str) -> EvalResult {
        match check_rubric(text) {
            None => EvalResult::pass(Self::NAME),
            Some(violation) => {
                tracing::debug!("Rubric evaluation: FAIL ({})", violation);
                EvalResult::fail(Self::NAME, violation)
            }
        }
    }
}
