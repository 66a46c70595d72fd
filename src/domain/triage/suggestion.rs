//! Guided-choice selection with a relevance score.
//!
//! Each clarification turn either reuses the choice set that follows from
//! the user's previous pick, or regenerates one when the conversation has
//! moved on. The decision is driven by a relevance score starting at 100
//! and lowered by the penalties below.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::choices::{
    catalog_choice_id, closed_choices, domain_choices, legacy_choices, legacy_domain_of,
    main_choices, sub_choices, GuidedChoice, CATALOG_CHOICE_PREFIX, DYNAMIC_CHOICE_PREFIX,
};
use super::context::TopicDomain;
use super::messages::{reasoning, ReasoningKind};
use super::question_parser::parse_choices_from_question;
use crate::domain::catalog::Category;

/// Below this score the choice set is regenerated.
pub const RELEVANCE_THRESHOLD: f64 = 70.0;

/// Confidence at or above which the score gets a bonus.
pub const CONFIDENCE_BOOST_THRESHOLD: f64 = 0.6;

/// Confidence below which the classifier is considered unsure.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.4;

pub const LOW_CONFIDENCE_PENALTY: f64 = 30.0;
pub const CONTEXT_CHANGE_PENALTY: f64 = 40.0;
pub const NO_PROGRESS_PENALTY: f64 = 20.0;
pub const NEW_INFO_PENALTY: f64 = 15.0;
pub const QUESTION_OPTIONS_PENALTY: f64 = 50.0;
pub const CONFIDENCE_BONUS: f64 = 10.0;

/// Minimum number of unseen significant words that count as new information.
pub const NEW_INFO_MIN_WORDS: usize = 2;

const STOPWORDS: &[&str] = &[
    "le", "la", "les", "un", "une", "de", "du", "des", "et", "ou", "mon", "ma", "mes", "ne", "pas",
    "plus", "est", "sont", "a", "ai",
];

/// Everything the engine looks at for one turn.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionContext<'a> {
    pub user_input: &'a str,
    /// Inputs of earlier turns of the same conversation.
    pub previous_inputs: &'a [String],
    pub detected_domain: Option<TopicDomain>,
    pub confidence: f64,
    pub attempt: u32,
    pub previous_choice_id: Option<&'a str>,
    pub clarification_question: Option<&'a str>,
    /// Live catalog; empty when unavailable.
    pub categories: &'a [Category],
}

/// Choices for the turn plus the reasoning behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub choices: Vec<GuidedChoice>,
    pub reasoning: String,
    pub should_regenerate: bool,
    pub regeneration_reason: Option<String>,
    pub relevance_score: f64,
}

/// Score and the factors that lowered it.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceAssessment {
    pub score: f64,
    pub reason: Option<&'static str>,
    pub context_changed: bool,
    pub question_has_options: bool,
}

/// Scores how well the cached choice set still fits the conversation.
pub fn assess_relevance(ctx: &SuggestionContext<'_>) -> RelevanceAssessment {
    let mut score = 100.0;
    let mut reason = None;
    let mut context_changed = false;
    let mut question_has_options = false;

    if ctx.confidence < LOW_CONFIDENCE_THRESHOLD {
        score -= LOW_CONFIDENCE_PENALTY;
        reason = Some("Confiance IA faible");
    }

    if let (Some(previous), Some(detected)) = (ctx.previous_choice_id, ctx.detected_domain) {
        if !is_context_consistent(previous, detected) {
            score -= CONTEXT_CHANGE_PENALTY;
            context_changed = true;
            reason = Some("Changement de contexte détecté");
        }
    }

    if ctx.attempt > 0 && ctx.detected_domain.is_none() {
        score -= NO_PROGRESS_PENALTY;
        reason = reason.or(Some("Pas de progression détectée"));
    }

    if !ctx.user_input.is_empty()
        && !ctx.previous_inputs.is_empty()
        && has_significant_new_info(ctx.user_input, ctx.previous_inputs)
    {
        score -= NEW_INFO_PENALTY;
        reason = reason.or(Some("Nouvelle information significative"));
    }

    if ctx.attempt > 0 && question_options(ctx).is_some() {
        score -= QUESTION_OPTIONS_PENALTY;
        question_has_options = true;
        reason = Some("L'IA a posé une question avec des options spécifiques");
    }

    if ctx.confidence >= CONFIDENCE_BOOST_THRESHOLD {
        score = f64::min(100.0, score + CONFIDENCE_BONUS);
    }

    RelevanceAssessment {
        score: score.clamp(0.0, 100.0),
        reason,
        context_changed,
        question_has_options,
    }
}

/// Picks the guided choices for a clarification turn.
pub fn get_suggestions(ctx: &SuggestionContext<'_>, seed: u64) -> Suggestions {
    let assessment = assess_relevance(ctx);
    let should_regenerate =
        assessment.score < RELEVANCE_THRESHOLD || assessment.question_has_options;

    let (choices, kind) = if ctx.attempt == 0 {
        match ctx.detected_domain {
            Some(domain) => (contextual_choices(ctx, domain), ReasoningKind::ContextDetected),
            None if ctx.confidence < LOW_CONFIDENCE_THRESHOLD => {
                (initial_choices(ctx), ReasoningKind::LowConfidence)
            }
            None => (initial_choices(ctx), ReasoningKind::FirstInteraction),
        }
    } else if ctx.attempt >= 2 {
        (closed_choices(), ReasoningKind::FinalAttempt)
    } else if should_regenerate {
        let kind = if assessment.context_changed {
            ReasoningKind::ContextChange
        } else {
            ReasoningKind::NarrowingDown
        };
        (dynamic_choices(ctx), kind)
    } else {
        (cached_choices(ctx), ReasoningKind::NarrowingDown)
    };

    Suggestions {
        choices,
        reasoning: reasoning(kind, ctx.detected_domain, ctx.user_input, seed),
        should_regenerate,
        regeneration_reason: assessment.reason.map(str::to_string),
        relevance_score: assessment.score,
    }
}

fn question_options(ctx: &SuggestionContext<'_>) -> Option<Vec<GuidedChoice>> {
    ctx.clarification_question
        .and_then(parse_choices_from_question)
}

fn initial_choices(ctx: &SuggestionContext<'_>) -> Vec<GuidedChoice> {
    if ctx.categories.is_empty() {
        legacy_choices(0, None, None)
    } else {
        main_choices(ctx.categories)
    }
}

fn contextual_choices(ctx: &SuggestionContext<'_>, domain: TopicDomain) -> Vec<GuidedChoice> {
    let children = domain_choices(ctx.categories, domain);
    if children.is_empty() {
        legacy_choices(0, Some(domain), None)
    } else {
        children
    }
}

fn dynamic_choices(ctx: &SuggestionContext<'_>) -> Vec<GuidedChoice> {
    if let Some(parsed) = question_options(ctx) {
        return parsed;
    }
    if let Some(domain) = ctx.detected_domain {
        let children = domain_choices(ctx.categories, domain);
        if !children.is_empty() {
            return children;
        }
    }
    if !ctx.categories.is_empty() {
        return main_choices(ctx.categories);
    }
    legacy_choices(0, ctx.detected_domain, None)
}

fn cached_choices(ctx: &SuggestionContext<'_>) -> Vec<GuidedChoice> {
    if let Some(parent_id) = ctx.previous_choice_id.and_then(catalog_choice_id) {
        let children = sub_choices(ctx.categories, parent_id);
        if !children.is_empty() {
            return children;
        }
    }
    legacy_choices(ctx.attempt, ctx.detected_domain, ctx.previous_choice_id)
}

/// Whether the previously picked choice agrees with the detected domain.
///
/// Catalog and parsed choices are trusted; legacy ids are compared through
/// the domain their group stands for.
pub fn is_context_consistent(previous_choice: &str, detected: TopicDomain) -> bool {
    if previous_choice.starts_with(CATALOG_CHOICE_PREFIX)
        || previous_choice.starts_with(DYNAMIC_CHOICE_PREFIX)
    {
        return true;
    }
    legacy_domain_of(previous_choice)
        .map(|domain| domain == detected)
        .unwrap_or(true)
}

/// True if `current` has enough significant words not seen in earlier turns.
pub fn has_significant_new_info(current: &str, previous: &[String]) -> bool {
    if previous.is_empty() {
        return true;
    }

    let seen: HashSet<String> = previous
        .iter()
        .flat_map(|p| p.to_lowercase().split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect();

    let current_lower = current.to_lowercase();
    let new_words: HashSet<&str> = current_lower
        .split_whitespace()
        .filter(|w| !seen.contains(*w) && !STOPWORDS.contains(w))
        .collect();

    new_words.len() >= NEW_INFO_MIN_WORDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::default_tree;
    use proptest::prelude::*;

    fn ctx<'a>(categories: &'a [Category], previous: &'a [String]) -> SuggestionContext<'a> {
        SuggestionContext {
            user_input: "ça ne marche pas",
            previous_inputs: previous,
            detected_domain: None,
            confidence: 0.2,
            attempt: 0,
            previous_choice_id: None,
            clarification_question: None,
            categories,
        }
    }

    #[test]
    fn first_attempt_without_domain_offers_main_domains() {
        let tree = default_tree();
        let result = get_suggestions(&ctx(&tree, &[]), 1);
        assert_eq!(result.choices, main_choices(&tree));
        assert!(result.choices.len() >= 2);
    }

    #[test]
    fn first_attempt_with_domain_offers_its_children() {
        let tree = default_tree();
        let mut c = ctx(&tree, &[]);
        c.detected_domain = Some(TopicDomain::Telephony);
        let result = get_suggestions(&c, 1);
        assert_eq!(result.choices, domain_choices(&tree, TopicDomain::Telephony));
    }

    #[test]
    fn first_attempt_without_catalog_uses_legacy_set() {
        let result = get_suggestions(&ctx(&[], &[]), 1);
        assert_eq!(result.choices[0].id, "hardware");
    }

    #[test]
    fn third_attempt_offers_closed_choices() {
        let tree = default_tree();
        let mut c = ctx(&tree, &[]);
        c.attempt = 2;
        c.detected_domain = Some(TopicDomain::Network);
        c.confidence = 0.9;
        let result = get_suggestions(&c, 1);
        assert_eq!(result.choices, closed_choices());
    }

    #[test]
    fn low_confidence_and_no_progress_trigger_regeneration() {
        let tree = default_tree();
        let mut c = ctx(&tree, &[]);
        c.attempt = 1;
        let assessment = assess_relevance(&c);
        assert_eq!(assessment.score, 50.0);
        assert_eq!(assessment.reason, Some("Confiance IA faible"));

        let result = get_suggestions(&c, 1);
        assert!(result.should_regenerate);
        assert_eq!(result.choices, main_choices(&tree));
    }

    #[test]
    fn question_with_options_wins_over_catalog() {
        let tree = default_tree();
        let mut c = ctx(&tree, &[]);
        c.attempt = 1;
        c.confidence = 0.65;
        c.detected_domain = Some(TopicDomain::Network);
        c.clarification_question = Some("Est-ce le WiFi, le câble ou le VPN ?");

        let result = get_suggestions(&c, 1);
        assert!(result.should_regenerate);
        assert!(result.choices.iter().all(|ch| ch.id.starts_with(DYNAMIC_CHOICE_PREFIX)));
        assert_eq!(
            result.regeneration_reason.as_deref(),
            Some("L'IA a posé une question avec des options spécifiques")
        );
    }

    #[test]
    fn consistent_follow_up_reuses_previous_pick_children() {
        let tree = default_tree();
        let mut c = ctx(&tree, &[]);
        c.attempt = 1;
        c.confidence = 0.65;
        c.detected_domain = Some(TopicDomain::Network);
        c.previous_choice_id = Some("cat_3");

        let result = get_suggestions(&c, 1);
        assert!(!result.should_regenerate);
        assert_eq!(result.relevance_score, 100.0);
        assert_eq!(result.choices, sub_choices(&tree, crate::domain::foundation::CategoryId::new(3)));
    }

    #[test]
    fn inconsistent_legacy_pick_is_a_context_change() {
        let tree = default_tree();
        let mut c = ctx(&tree, &[]);
        c.attempt = 1;
        c.confidence = 0.65;
        c.detected_domain = Some(TopicDomain::Security);
        c.previous_choice_id = Some("net_wifi");

        let assessment = assess_relevance(&c);
        assert!(assessment.context_changed);
        assert_eq!(assessment.score, 70.0);
    }

    #[test]
    fn legacy_consistency_uses_group_domain() {
        assert!(is_context_consistent("net_vpn", TopicDomain::Network));
        assert!(!is_context_consistent("net_vpn", TopicDomain::Messaging));
        assert!(is_context_consistent("cat_4", TopicDomain::Messaging));
        assert!(is_context_consistent("dynamic_wifi", TopicDomain::Messaging));
        assert!(is_context_consistent("unknown", TopicDomain::Messaging));
    }

    #[test]
    fn new_info_ignores_stopwords_and_seen_words() {
        let previous = vec!["mon pc est lent".to_string()];
        assert!(!has_significant_new_info("mon pc est très lent", &previous));
        assert!(has_significant_new_info("écran noir au démarrage", &previous));
        assert!(has_significant_new_info("n'importe quoi", &[]));
    }

    proptest! {
        #[test]
        fn relevance_score_stays_in_range(
            confidence in 0.0f64..=1.0,
            attempt in 0u32..4,
            detected in proptest::option::of(0usize..9),
            with_question in any::<bool>(),
            with_previous in any::<bool>(),
        ) {
            let previous = vec!["mon pc est lent".to_string()];
            let c = SuggestionContext {
                user_input: "le wifi coupe souvent la visio",
                previous_inputs: if with_previous { previous.as_slice() } else { &[] },
                detected_domain: detected.map(|i| TopicDomain::ALL[i]),
                confidence,
                attempt,
                previous_choice_id: Some("hw_slow"),
                clarification_question: with_question.then_some("1. WiFi 2. VPN"),
                categories: &[],
            };
            let assessment = assess_relevance(&c);
            prop_assert!((0.0..=100.0).contains(&assessment.score));
        }
    }
}
