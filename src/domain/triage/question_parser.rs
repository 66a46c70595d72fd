//! Extraction of answer options from a clarification question.
//!
//! When the classifier asks "WiFi, Ethernet ou VPN ?" the options are more
//! useful to the user than any static choice set.

use once_cell::sync::Lazy;
use regex::Regex;

use super::choices::{GuidedChoice, DYNAMIC_CHOICE_PREFIX};

/// Maximum number of parsed options (before the synthetic "other").
pub const MAX_PARSED_OPTIONS: usize = 5;

/// Minimum number of options for a question to count as a list.
pub const MIN_PARSED_OPTIONS: usize = 2;

const DYNAMIC_ICONS: &[&str] = &["💻", "📱", "📟", "🔧", "🖥️", "🌐", "📋", "⚙️"];

static LIST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?i)(?:votre|un|une|le|la|les|du|de la|des|l'|d')?\s*([\w\s'-]+(?:,\s*[\w\s'-]+)*(?:\s*,?\s*\b(?:ou|or)\s+[\w\s'-]+))",
    )
});

static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\s*,?\s*\b(?:ou|or)\s+"));

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| compile(r"\d+[.)]\s*"));

static DASHED_ITEM: Lazy<Regex> = Lazy::new(|| compile(r"(?:^|\s)-\s*"));

/// Builds one of the constant patterns above.
fn compile(pattern: &'static str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static pattern {:?}: {}", pattern, e))
}

fn clean(option: &str) -> Option<String> {
    let trimmed = option.trim();
    if trimmed.chars().count() < 2 {
        return None;
    }
    let cleaned = trimmed.trim_end_matches(['?', '.', ' ']).to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Strategy (a): "a, b ou c".
fn parse_list(question: &str) -> Vec<String> {
    let Some(captures) = LIST_PATTERN.captures(question) else {
        return Vec::new();
    };
    let Some(raw) = captures.get(1) else {
        return Vec::new();
    };

    LIST_SEPARATOR
        .split(raw.as_str().trim())
        .flat_map(|part| part.split(','))
        .filter_map(clean)
        .collect()
}

/// Splits `question` on every match of `marker`, dropping the text before the first one.
fn split_items(question: &str, marker: &Regex) -> Vec<String> {
    let starts: Vec<(usize, usize)> = marker
        .find_iter(question)
        .map(|m| (m.start(), m.end()))
        .collect();
    if starts.len() < MIN_PARSED_OPTIONS {
        return Vec::new();
    }

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, (_, content_start))| {
            let end = starts.get(i + 1).map(|(s, _)| *s).unwrap_or(question.len());
            clean(&question[*content_start..end])
        })
        .collect()
}

/// Extracts options from the question, or `None` when it is not a list.
///
/// Strategies are tried in order: comma/"ou" list, numbered items, dashed
/// items. The first one yielding at least two options wins.
pub fn parse_choices_from_question(question: &str) -> Option<Vec<GuidedChoice>> {
    if question.trim().is_empty() {
        return None;
    }

    let mut options = parse_list(question);
    if options.len() < MIN_PARSED_OPTIONS {
        options = split_items(question, &NUMBERED_ITEM);
    }
    if options.len() < MIN_PARSED_OPTIONS {
        options = split_items(question, &DASHED_ITEM);
    }
    if options.len() < MIN_PARSED_OPTIONS {
        return None;
    }

    options.truncate(MAX_PARSED_OPTIONS);

    let mut choices: Vec<GuidedChoice> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            GuidedChoice::new(
                dynamic_id(option),
                capitalize(option),
                DYNAMIC_ICONS[i % DYNAMIC_ICONS.len()],
            )
        })
        .collect();

    if !choices.iter().any(GuidedChoice::is_other) {
        choices.push(GuidedChoice::new("dynamic_other", "Autre", "🔧"));
    }

    Some(choices)
}

fn dynamic_id(option: &str) -> String {
    let slug: String = option
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect();
    format!("{}{}", DYNAMIC_CHOICE_PREFIX, slug)
}

fn capitalize(option: &str) -> String {
    let mut chars = option.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
