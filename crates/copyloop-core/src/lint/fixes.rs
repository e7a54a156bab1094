//! Fix instructions for known lint and heuristic messages.

use crate::heuristics::WEASEL_WORDS;

use super::short_description::{MISSING_PERIOD, NOT_IMPERATIVE};

const STATIC_TEMPLATES: &[(&str, &str)] = &[
    (
        NOT_IMPERATIVE,
        "Remove any surrounding quotation marks and rewrite so the sentence begins with an imperative verb.",
    ),
    (
        "exceeds 72 characters",
        "Shorten the sentence to no more than 72 characters.",
    ),
    (MISSING_PERIOD, "Add a period at the end of the sentence."),
    (
        "sentence exceeds 20 words",
        "Split this into shorter sentences (20 words or fewer each).",
    ),
    (
        "passive voice > 10% of sentences",
        "Convert passive-voice sentences to active-voice.",
    ),
    (
        "acronym detected: API",
        "On first use, expand 'API' to 'Application Programming Interface'.",
    ),
];

/// Prefixes marking a message that is already an instruction.
const INSTRUCTION_PREFIXES: &[&str] = &["remove", "shorten", "convert"];

/// Instruction for one known message, if a template exists.
pub fn fix_template(message: &str) -> Option<String> {
    if let Some((_, fix)) = STATIC_TEMPLATES.iter().find(|(m, _)| *m == message) {
        return Some(fix.to_string());
    }
    let word = message.strip_prefix("weasel word: ")?;
    WEASEL_WORDS
        .contains(&word)
        .then(|| format!("Remove the word '{word}' to strengthen clarity."))
}

/// Map each message to an instruction and join them with a space.
///
/// Messages that already read as instructions pass through; unknown ones
/// become `Please fix this issue: <msg>`.
pub fn build_fix<S: AsRef<str>>(errors: &[S]) -> String {
    errors
        .iter()
        .map(|e| {
            let msg = e.as_ref();
            let lower = msg.to_lowercase();
            if INSTRUCTION_PREFIXES.iter().any(|p| lower.starts_with(p)) {
                msg.to_string()
            } else {
                fix_template(msg).unwrap_or_else(|| format!("Please fix this issue: {msg}"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_messages() {
        let fix = build_fix(&["missing trailing period", "mystery"]);
        assert_eq!(
            fix,
            "Add a period at the end of the sentence. Please fix this issue: mystery"
        );
    }

    #[test]
    fn test_weasel_word_template() {
        assert_eq!(
            fix_template("weasel word: very").as_deref(),
            Some("Remove the word 'very' to strengthen clarity.")
        );
        assert!(fix_template("weasel word: banana").is_none());
    }

    #[test]
    fn test_instructions_pass_through() {
        let errors = vec!["Shorten the intro.".to_string()];
        assert_eq!(build_fix(&errors), "Shorten the intro.");
    }

    #[test]
    fn test_empty() {
        assert_eq!(build_fix::<&str>(&[]), "");
    }
}
