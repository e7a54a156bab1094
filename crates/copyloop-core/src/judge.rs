//! Judged evaluators: clarity, tone and empathy.
//!
//! Each evaluator renders one prompt, sends it to a [`JudgeBackend`] and
//! parses a JSON verdict from the reply. A reply wrapped in a Markdown code
//! fence is accepted. When the backend fails or the reply does not parse,
//! the evaluator falls back to the worst-case verdict so the run continues
//! with a `FAIL` whose explanation starts with `evaluation error:`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::EvalResult;
use crate::evaluator::{Evaluator, EvaluatorKind, JudgeBackend};

/// Brand voice used by the tone judge when none is configured.
pub const DEFAULT_BRAND_VOICE: &str = "clear and professional";

/// Scores below this fail clarity and tone.
pub const MIN_PASSING_SCORE: f64 = 3.0;

const EVALUATION_ERROR_PREFIX: &str = "evaluation error:";

/// Strip an optional Markdown code fence (with or without a language tag).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a judge reply into a verdict.
pub fn parse_verdict<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| format!("invalid judge reply: {e}"))
}

async fn ask<T: DeserializeOwned>(backend: &dyn JudgeBackend, prompt: &str) -> Result<T, String> {
    let raw = backend.judge(prompt).await.map_err(|e| e.to_string())?;
    debug!(reply_len = raw.len(), "judge replied");
    parse_verdict(&raw)
}

fn evaluation_error(cause: &str) -> String {
    format!("{EVALUATION_ERROR_PREFIX} {cause}")
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClarityVerdict {
    pub clarity_score: f64,
    #[serde(default)]
    pub clarity_explanation: String,
    pub actionable: bool,
    #[serde(default)]
    pub actionability_comment: String,
}

impl ClarityVerdict {
    fn worst(cause: &str) -> Self {
        Self {
            clarity_score: 0.0,
            clarity_explanation: evaluation_error(cause),
            actionable: false,
            actionability_comment: evaluation_error(cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToneVerdict {
    pub tone_score: f64,
    pub tone_alignment: bool,
    #[serde(default)]
    pub tone_explanation: String,
}

impl ToneVerdict {
    fn worst(cause: &str) -> Self {
        Self {
            tone_score: 0.0,
            tone_alignment: false,
            tone_explanation: evaluation_error(cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmpathyVerdict {
    pub empathetic: bool,
    #[serde(default)]
    pub suggestion: String,
}

impl EmpathyVerdict {
    fn worst(cause: &str) -> Self {
        Self {
            empathetic: false,
            suggestion: evaluation_error(cause),
        }
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

pub fn clarity_prompt(text: &str) -> String {
    format!(
        r#"You are an expert UX writer. Evaluate the following error message:

"""{text}"""

1) Rate its clarity on a scale of 1 (confusing) to 5 (crystal-clear).
2) Is it immediately actionable? (Yes/No).
3) For each, provide a brief explanation.

Respond in JSON only, for example:
{{
  "clarity_score": 4,
  "clarity_explanation": "...",
  "actionable": true,
  "actionability_comment": "..."
}}"#
    )
}

pub fn tone_prompt(text: &str, brand_voice: &str) -> String {
    format!(
        r#"You are an expert UX writer. Our brand voice is: {brand_voice}.
Evaluate the tone of the following error message:

"""{text}"""

1) Rate how well the tone matches the brand voice on a scale of 1 (off-brand) to 5 (on-brand).
2) Is the tone aligned with the brand voice? (Yes/No).
3) Explain briefly what to change.

Respond in JSON only, for example:
{{
  "tone_score": 4,
  "tone_alignment": true,
  "tone_explanation": "..."
}}"#
    )
}

pub fn empathy_prompt(text: &str) -> String {
    format!(
        r#"You are an expert UX writer. Evaluate whether the following error message is empathetic toward a frustrated user without blaming them:

"""{text}"""

If it is not empathetic, suggest one concrete change.

Respond in JSON only, for example:
{{
  "empathetic": false,
  "suggestion": "..."
}}"#
    )
}

// ---------------------------------------------------------------------------
// Evaluators
// ---------------------------------------------------------------------------

pub struct ClarityJudge {
    backend: Arc<dyn JudgeBackend>,
}

impl ClarityJudge {
    pub const NAME: &'static str = "clarity";

    pub fn new(backend: Arc<dyn JudgeBackend>) -> Self {
        Self { backend }
    }

    async fn try_verdict(&self, text: &str) -> Result<ClarityVerdict, String> {
        ask(self.backend.as_ref(), &clarity_prompt(text)).await
    }

    pub async fn verdict(&self, text: &str) -> ClarityVerdict {
        self.try_verdict(text).await.unwrap_or_else(|cause| {
            warn!(evaluator = Self::NAME, "{}", cause);
            ClarityVerdict::worst(&cause)
        })
    }
}

#[async_trait]
impl Evaluator for ClarityJudge {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Judged
    }

    async fn evaluate(&self, text: &str) -> EvalResult {
        // Both halves of the worst verdict carry the same cause; report it once.
        let v = match self.try_verdict(text).await {
            Ok(v) => v,
            Err(cause) => {
                warn!(evaluator = Self::NAME, "{}", cause);
                return EvalResult::fail(Self::NAME, evaluation_error(&cause));
            }
        };
        if v.clarity_score < MIN_PASSING_SCORE || !v.actionable {
            return EvalResult::fail(
                Self::NAME,
                format!(
                    "Clarity: {}\nActionability: {}",
                    v.clarity_explanation, v.actionability_comment
                ),
            );
        }
        EvalResult::pass(Self::NAME)
    }
}

pub struct ToneJudge {
    backend: Arc<dyn JudgeBackend>,
    brand_voice: String,
}

impl ToneJudge {
    pub const NAME: &'static str = "tone";

    pub fn new(backend: Arc<dyn JudgeBackend>, brand_voice: impl Into<String>) -> Self {
        Self {
            backend,
            brand_voice: brand_voice.into(),
        }
    }

    pub fn brand_voice(&self) -> &str {
        &self.brand_voice
    }

    pub async fn verdict(&self, text: &str) -> ToneVerdict {
        ask(self.backend.as_ref(), &tone_prompt(text, &self.brand_voice))
            .await
            .unwrap_or_else(|cause| {
                warn!(evaluator = Self::NAME, "{}", cause);
                ToneVerdict::worst(&cause)
            })
    }
}

#[async_trait]
impl Evaluator for ToneJudge {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Judged
    }

    async fn evaluate(&self, text: &str) -> EvalResult {
        let v = self.verdict(text).await;
        if v.tone_score < MIN_PASSING_SCORE || !v.tone_alignment {
            return EvalResult::fail(Self::NAME, v.tone_explanation);
        }
        EvalResult::pass(Self::NAME)
    }
}

pub struct EmpathyJudge {
    backend: Arc<dyn JudgeBackend>,
}

impl EmpathyJudge {
    pub const NAME: &'static str = "empathy";

    pub fn new(backend: Arc<dyn JudgeBackend>) -> Self {
        Self { backend }
    }

    pub async fn verdict(&self, text: &str) -> EmpathyVerdict {
        ask(self.backend.as_ref(), &empathy_prompt(text))
            .await
            .unwrap_or_else(|cause| {
                warn!(evaluator = Self::NAME, "{}", cause);
                EmpathyVerdict::worst(&cause)
            })
    }
}

#[async_trait]
impl Evaluator for EmpathyJudge {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Judged
    }

    async fn evaluate(&self, text: &str) -> EvalResult {
        let v = self.verdict(text).await;
        if !v.empathetic {
            return EvalResult::fail(Self::NAME, v.suggestion);
        }
        EvalResult::pass(Self::NAME)
    }
}
