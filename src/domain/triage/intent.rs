//! Confirmation intent of short user replies.

use serde::{Deserialize, Serialize};

/// Replies that count as a confirmation.
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "ok",
    "oui",
    "yes",
    "d'accord",
    "daccord",
    "valide",
    "confirme",
    "confirm",
    "correct",
    "exactement",
    "tout à fait",
    "parfait",
    "go",
];

/// Words that weigh against a confirmation.
pub const NEGATIVE_KEYWORDS: &[&str] = &["non", "no", "pas", "jamais", "incorrect", "faux", "erreur"];

/// Phrases that negate whatever positive keyword they contain.
const NEGATION_PATTERNS: &[&str] = &[
    "ne pas",
    "n'est pas",
    "nest pas",
    "pas du tout",
    "ce n'est",
    "ce nest",
    "ça n'est",
    "ça nest",
    "not at all",
    "isn't",
    "is not",
    "not ok",
];

/// Three-way reading of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Positive,
    Negative,
    Unclear,
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn count_present(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

/// True if `text` reads as a confirmation.
///
/// An exact keyword wins. Otherwise any negation pattern rejects the reply
/// before the looser substring check is attempted.
pub fn validate_positive_intent(text: &str) -> bool {
    let cleaned = normalize(text);

    if POSITIVE_KEYWORDS.contains(&cleaned.as_str()) {
        return true;
    }

    if NEGATION_PATTERNS.iter().any(|p| cleaned.contains(p)) {
        return false;
    }

    let positives = count_present(&cleaned, POSITIVE_KEYWORDS);
    positives > 0 && positives > count_present(&cleaned, NEGATIVE_KEYWORDS)
}

/// Classifies `text` as positive, negative or unclear.
pub fn classify_intent(text: &str) -> Intent {
    if validate_positive_intent(text) {
        return Intent::Positive;
    }

    let cleaned = normalize(text);
    if NEGATIVE_KEYWORDS.iter().any(|k| cleaned.contains(k)) {
        Intent::Negative
    } else {
        Intent::Unclear
    }
}
