//! Rules for a one-line short description.

use std::sync::OnceLock;

use regex::Regex;

use super::LintReport;

pub const MAX_CHARS: usize = 72;

const FILLER_OPENERS: &[&str] = &["this", "a", "an"];

pub const ONE_LINE: &str = "one physical line";
pub const MISSING_PERIOD: &str = "missing trailing period";
pub const NOT_IMPERATIVE: &str = "should start with an imperative-mood verb";
pub const FILLER_OPENER: &str = "don't start with fillers like 'This ...'";

fn verb_first_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Capitalised word followed by whitespace; a cheap stand-in for a verb.
    RE.get_or_init(|| Regex::new(r"^[A-Z][a-z]+\s").expect("verb pattern is valid"))
}

pub fn too_long_message() -> String {
    format!("exceeds {MAX_CHARS} characters")
}

/// Up to and including the first period, or the whole text when there is none.
pub fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    match text.find('.') {
        Some(i) => &text[..=i],
        None => text,
    }
}

/// Violations for a single sentence, in check order.
pub fn check_sentence(sentence: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if sentence.contains('\n') {
        errors.push(ONE_LINE.to_string());
    }
    if sentence.chars().count() > MAX_CHARS {
        errors.push(too_long_message());
    }
    if !sentence.ends_with('.') {
        errors.push(MISSING_PERIOD.to_string());
    }
    if !verb_first_regex().is_match(sentence) {
        errors.push(NOT_IMPERATIVE.to_string());
    }
    let opener = sentence
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    if FILLER_OPENERS.contains(&opener.as_str()) {
        errors.push(FILLER_OPENER.to_string());
    }
    errors
}

/// Lint a short description. Multi-line input fails with only the one-line
/// rule; otherwise the first sentence is checked.
pub fn lint_short_description(text: &str) -> LintReport {
    if text.contains('\n') {
        return LintReport::from_errors(vec![ONE_LINE.to_string()]);
    }
    LintReport::from_errors(check_sentence(first_sentence(text)))
}
