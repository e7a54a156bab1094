//! Evaluator registry and selection.
//!
//! The registry is a fixed table of constructors built by
//! [`EvaluatorRegistry::builtin`]. Callers own it and resolve a selection
//! against it; nothing here is process-global.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{CopyloopError, Result};
use crate::evaluator::{Evaluator, EvaluatorKind, JudgeBackend};
use crate::heuristics::{ForbiddenWords, HeuristicsEvaluator};
use crate::judge::{ClarityJudge, EmpathyJudge, ToneJudge, DEFAULT_BRAND_VOICE};
use crate::rubric::RubricEvaluator;

/// Which evaluators to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EvaluatorSelection {
    /// Every fast evaluator plus `clarity`.
    #[default]
    Default,
    /// Every fast evaluator.
    FastOnly,
    /// No evaluation; the first draft is accepted as is.
    None,
    /// Explicit ordered names, duplicates allowed.
    Named(Vec<String>),
}

/// Per-evaluator configuration used while resolving a selection.
#[derive(Clone)]
pub struct EvaluatorContext {
    /// Word list for `heuristics`; the built-in list when `None`.
    pub forbidden_file: Option<PathBuf>,
    /// Brand voice for `tone`.
    pub brand_voice: String,
    /// Backend for judged evaluators.
    pub judge: Option<Arc<dyn JudgeBackend>>,
}

impl Default for EvaluatorContext {
    fn default() -> Self {
        Self {
            forbidden_file: None,
            brand_voice: DEFAULT_BRAND_VOICE.to_string(),
            judge: None,
        }
    }
}

impl EvaluatorContext {
    pub fn with_judge(mut self, judge: Arc<dyn JudgeBackend>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_forbidden_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.forbidden_file = Some(path.into());
        self
    }

    pub fn with_brand_voice(mut self, voice: impl Into<String>) -> Self {
        self.brand_voice = voice.into();
        self
    }

    fn judge_for(&self, name: &str) -> Result<Arc<dyn JudgeBackend>> {
        self.judge
            .clone()
            .ok_or_else(|| CopyloopError::JudgeUnavailable {
                name: name.to_string(),
            })
    }

    fn forbidden_words(&self) -> Result<ForbiddenWords> {
        match &self.forbidden_file {
            Some(path) => ForbiddenWords::load(path),
            None => Ok(ForbiddenWords::builtin()),
        }
    }
}

type Constructor = fn(&EvaluatorContext) -> Result<Arc<dyn Evaluator>>;

struct Entry {
    name: &'static str,
    kind: EvaluatorKind,
    build: Constructor,
}

fn build_heuristics(ctx: &EvaluatorContext) -> Result<Arc<dyn Evaluator>> {
    Ok(Arc::new(HeuristicsEvaluator::new(ctx.forbidden_words()?)))
}

fn build_rubric(_: &EvaluatorContext) -> Result<Arc<dyn Evaluator>> {
    Ok(Arc::new(RubricEvaluator))
}

fn build_clarity(ctx: &EvaluatorContext) -> Result<Arc<dyn Evaluator>> {
    Ok(Arc::new(ClarityJudge::new(ctx.judge_for(ClarityJudge::NAME)?)))
}

fn build_empathy(ctx: &EvaluatorContext) -> Result<Arc<dyn Evaluator>> {
    Ok(Arc::new(EmpathyJudge::new(ctx.judge_for(EmpathyJudge::NAME)?)))
}

fn build_tone(ctx: &EvaluatorContext) -> Result<Arc<dyn Evaluator>> {
    Ok(Arc::new(ToneJudge::new(
        ctx.judge_for(ToneJudge::NAME)?,
        ctx.brand_voice.clone(),
    )))
}

/// Immutable table of known evaluators, in listing order.
pub struct EvaluatorRegistry {
    entries: Vec<Entry>,
}

impl EvaluatorRegistry {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                Entry {
                    name: HeuristicsEvaluator::NAME,
                    kind: EvaluatorKind::Fast,
                    build: build_heuristics,
                },
                Entry {
                    name: RubricEvaluator::NAME,
                    kind: EvaluatorKind::Fast,
                    build: build_rubric,
                },
                Entry {
                    name: ClarityJudge::NAME,
                    kind: EvaluatorKind::Judged,
                    build: build_clarity,
                },
                Entry {
                    name: EmpathyJudge::NAME,
                    kind: EvaluatorKind::Judged,
                    build: build_empathy,
                },
                Entry {
                    name: ToneJudge::NAME,
                    kind: EvaluatorKind::Judged,
                    build: build_tone,
                },
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// `(name, kind)` for every registered evaluator.
    pub fn describe(&self) -> Vec<(&'static str, EvaluatorKind)> {
        self.entries.iter().map(|e| (e.name, e.kind)).collect()
    }

    fn fast_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.kind == EvaluatorKind::Fast)
            .map(|e| e.name.to_string())
            .collect()
    }

    /// Expand a selection to concrete names without constructing anything.
    pub fn selected_names(&self, selection: &EvaluatorSelection) -> Vec<String> {
        match selection {
            EvaluatorSelection::None => Vec::new(),
            EvaluatorSelection::FastOnly => self.fast_names(),
            EvaluatorSelection::Default => {
                let mut names = self.fast_names();
                names.push(ClarityJudge::NAME.to_string());
                names
            }
            EvaluatorSelection::Named(names) => names.clone(),
        }
    }

    /// Build the evaluators for `selection`, in order.
    ///
    /// Every name is checked before anything is constructed, so an unknown
    /// name fails without touching the filesystem or the judge.
    pub fn resolve(
        &self,
        selection: &EvaluatorSelection,
        ctx: &EvaluatorContext,
    ) -> Result<Vec<Arc<dyn Evaluator>>> {
        let names = self.selected_names(selection);

        let entries = names
            .iter()
            .map(|name| {
                self.entries
                    .iter()
                    .find(|e| e.name == name.as_str())
                    .ok_or_else(|| CopyloopError::UnknownEvaluator {
                        name: name.clone(),
                        available: self.names().into_iter().map(String::from).collect(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(evaluators = ?names, "resolving evaluators");
        entries.into_iter().map(|e| (e.build)(ctx)).collect()
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
