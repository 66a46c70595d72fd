//! Early detection of messages that should not start a triage.

use super::context::has_context_keyword;

/// Maximum number of tokens a greeting-only message may contain.
pub const GREETING_MAX_TOKENS: usize = 3;

const GREETING_TOKENS: &[&str] = &[
    "bonjour", "salut", "hello", "hi", "coucou", "bonsoir", "hey", "merci", "yo", "slt", "bjr",
    "cc", "re",
];

const NON_IT_KEYWORDS: &[&str] = &[
    "météo",
    "meteo",
    "recette",
    "cuisine",
    "football",
    "foot",
    "match",
    "blague",
    "horoscope",
    "restaurant",
    "vacances",
    "film",
    "série",
    "musique",
    "politique",
];

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True for a short salutation that carries no problem description.
pub fn is_greeting_only(text: &str) -> bool {
    let tokens = tokens(text);
    !tokens.is_empty()
        && tokens.len() <= GREETING_MAX_TOKENS
        && tokens.iter().any(|t| GREETING_TOKENS.contains(&t.as_str()))
        && !has_context_keyword(text)
}

/// True for a message about something other than IT support.
///
/// A non-IT keyword alone is not enough: any IT context keyword in the same
/// message keeps it in scope ("le wifi du restaurant" is an IT report).
pub fn is_non_it_message(text: &str) -> bool {
    let tokens = tokens(text);
    tokens.iter().any(|t| NON_IT_KEYWORDS.contains(&t.as_str())) && !has_context_keyword(text)
}
