//! Static writing heuristics and the `heuristics` evaluator.
//!
//! Checks, in reporting order:
//! - forbidden words (with common suffixes)
//! - sentences longer than [`MAX_WORDS_PER_SENTENCE`]
//! - passive voice in at least [`PASSIVE_VOICE_THRESHOLD`] of sentences
//! - weasel words
//! - all-caps acronyms
//!
//! A Flesch reading-ease score is computed alongside but never fails a text.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{EvalResult, Result};
use crate::evaluator::{Evaluator, EvaluatorKind};

pub const MAX_WORDS_PER_SENTENCE: usize = 20;

/// Share of passive sentences at which the passive-voice check fires.
pub const PASSIVE_VOICE_THRESHOLD: f64 = 0.1;

pub const WEASEL_WORDS: &[&str] = &[
    "actually",
    "basically",
    "fairly",
    "in order to",
    "just",
    "quite",
    "really",
    "very",
];

const BUILTIN_FORBIDDEN_WORDS: &str = include_str!("forbidden_words.txt");

fn passive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:is|are|was|were|be|been|being)\s+\w+(?:ed|en|t)\b")
            .expect("passive voice pattern is valid")
    })
}

fn acronym_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z]{2,})s?\b").expect("acronym pattern is valid"))
}

fn sentence_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence break pattern is valid"))
}

fn weasel_regexes() -> &'static [(&'static str, Regex)] {
    static RES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        WEASEL_WORDS
            .iter()
            .map(|w| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w)))
                    .expect("escaped weasel word is a valid pattern");
                (*w, re)
            })
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Issues and report
// ---------------------------------------------------------------------------

/// One heuristic finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeuristicIssue {
    ForbiddenWord { word: String },
    LongSentence { sentence: String, max_words: usize },
    PassiveVoice { ratio: f64, threshold: f64 },
    WeaselWord { word: String },
    Acronym { acronym: String },
}

impl HeuristicIssue {
    /// Stable, human-readable message. The same problem always produces the
    /// same message so repeated failures can be recognised.
    pub fn message(&self) -> String {
        match self {
            HeuristicIssue::ForbiddenWord { word } => format!("forbidden word: {word}"),
            HeuristicIssue::LongSentence { max_words, .. } => {
                format!("sentence exceeds {max_words} words")
            }
            HeuristicIssue::PassiveVoice { threshold, .. } => {
                format!(
                    "passive voice > {}% of sentences",
                    (threshold * 100.0).round() as u32
                )
            }
            HeuristicIssue::WeaselWord { word } => format!("weasel word: {word}"),
            HeuristicIssue::Acronym { acronym } => format!("acronym detected: {acronym}"),
        }
    }
}

/// Aggregated output of [`run_heuristics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeuristicsReport {
    /// Flesch reading ease; higher is easier.
    pub readability: f64,
    /// Forbidden words found in the text.
    pub forbidden: Vec<String>,
    pub issues: Vec<HeuristicIssue>,
}

impl HeuristicsReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(HeuristicIssue::message).collect()
    }
}

// ---------------------------------------------------------------------------
// Forbidden words
// ---------------------------------------------------------------------------

/// Compiled forbidden-word list.
#[derive(Debug, Clone)]
pub struct ForbiddenWords {
    entries: Vec<(String, Regex)>,
}

impl ForbiddenWords {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = words
            .into_iter()
            .map(Into::into)
            .filter_map(|word| {
                let pattern = format!(r"(?i)\b{}(?:ly|ing|ed|s|es)?\b", regex::escape(&word));
                match Regex::new(&pattern) {
                    Ok(re) => Some((word, re)),
                    Err(e) => {
                        warn!(word = %word, error = %e, "skipping unusable forbidden word");
                        None
                    }
                }
            })
            .collect();
        Self { entries }
    }

    /// Parse a word list: one word per line, blank lines and `#` comments
    /// ignored.
    pub fn parse(content: &str) -> Self {
        Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// The list shipped with copyloop.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_FORBIDDEN_WORDS)
    }

    pub fn words(&self) -> Vec<&str> {
        self.entries.iter().map(|(w, _)| w.as_str()).collect()
    }

    pub fn check(&self, text: &str) -> Vec<HeuristicIssue> {
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(word, _)| HeuristicIssue::ForbiddenWord { word: word.clone() })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Split after `.`, `!` or `?` followed by whitespace. Empty pieces dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in sentence_break_regex().find_iter(text) {
        // Terminal punctuation is a single ASCII byte.
        let end = m.start() + 1;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

pub fn sentence_length_issues(text: &str, max_words: usize) -> Vec<HeuristicIssue> {
    split_sentences(text)
        .into_iter()
        .filter(|s| s.split_whitespace().count() > max_words)
        .map(|s| HeuristicIssue::LongSentence {
            sentence: s.to_string(),
            max_words,
        })
        .collect()
}

pub fn passive_voice_issues(text: &str, threshold: f64) -> Vec<HeuristicIssue> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }
    let passive = sentences
        .iter()
        .filter(|s| passive_regex().is_match(s))
        .count();
    let ratio = passive as f64 / sentences.len() as f64;
    if ratio >= threshold {
        vec![HeuristicIssue::PassiveVoice { ratio, threshold }]
    } else {
        Vec::new()
    }
}

pub fn weasel_word_issues(text: &str) -> Vec<HeuristicIssue> {
    weasel_regexes()
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(word, _)| HeuristicIssue::WeaselWord {
            word: word.to_string(),
        })
        .collect()
}

pub fn acronym_issues(text: &str) -> Vec<HeuristicIssue> {
    let found: BTreeSet<&str> = acronym_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    found
        .into_iter()
        .map(|a| HeuristicIssue::Acronym {
            acronym: a.to_string(),
        })
        .collect()
}

/// Flesch reading ease. Returns 0.0 for text without words.
pub fn readability_grade(text: &str) -> f64 {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphabetic())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return 0.0;
    }
    let sentences = split_sentences(text).len().max(1) as f64;
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let word_count = words.len() as f64;

    206.835 - 1.015 * (word_count / sentences) - 84.6 * (syllables as f64 / word_count)
}

/// Vowel-group syllable estimate with a silent trailing `e`.
fn count_syllables(word: &str) -> usize {
    let mut count = 0;
    let mut prev_vowel = false;
    for c in word.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    if count > 1 && word.ends_with('e') && !word.ends_with("le") {
        count -= 1;
    }
    count.max(1)
}

/// Run every static check.
pub fn run_heuristics(text: &str, forbidden: &ForbiddenWords) -> HeuristicsReport {
    let mut issues = forbidden.check(text);
    issues.extend(sentence_length_issues(text, MAX_WORDS_PER_SENTENCE));
    issues.extend(passive_voice_issues(text, PASSIVE_VOICE_THRESHOLD));
    issues.extend(weasel_word_issues(text));
    issues.extend(acronym_issues(text));

    let forbidden = issues
        .iter()
        .filter_map(|i| match i {
            HeuristicIssue::ForbiddenWord { word } => Some(word.clone()),
            _ => None,
        })
        .collect();

    HeuristicsReport {
        readability: readability_grade(text),
        forbidden,
        issues,
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Fast evaluator failing on any heuristic issue; the failure lists every
/// issue message on its own line.
pub struct HeuristicsEvaluator {
    forbidden: ForbiddenWords,
}

impl HeuristicsEvaluator {
    pub const NAME: &'static str = "heuristics";

    pub fn new(forbidden: ForbiddenWords) -> Self {
        Self { forbidden }
    }
}

#[async_trait]
impl Evaluator for HeuristicsEvaluator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Fast
    }

    async fn evaluate(&self, text: &str) -> EvalResult {
        let report = run_heuristics(text, &self.forbidden);
        if report.passed() {
            debug!("Heuristics passed");
            return EvalResult::pass(Self::NAME);
        }

        let messages = report.messages();
        debug!("Heuristics found {} issue(s)", messages.len());
        for message in &messages {
            debug!("  - {}", message);
        }
        EvalResult::fail(Self::NAME, messages.join("\n"))
    }
}
