//! Triage domain module.
//!
//! Pure conversation logic: confidence gating, context and intent
//! heuristics, guided choices, suggestion scoring, message templates, and
//! the `AnalysisSession` aggregate that carries state between turns.

mod action;
mod choices;
mod context;
mod detection;
mod errors;
mod intent;
mod messages;
mod question_parser;
mod session;
mod suggestion;
mod summary;

pub use action::{
    TriageAction, ASK_CLARIFICATION_THRESHOLD, AUTO_VALIDATE_THRESHOLD, CONFIRM_SUMMARY_THRESHOLD,
};
pub use choices::{
    catalog_choice_id, closed_choices, domain_choices, legacy_choices, legacy_domain_of,
    legacy_group_for, legacy_main_choices, legacy_sub_choices, main_choices, sub_choices,
    topic_shift_choices, GuidedChoice, CATALOG_CHOICE_PREFIX, DYNAMIC_CHOICE_PREFIX,
};
pub use context::{
    detect_context, detect_topic_shift, has_context_keyword, Recommendation, TopicDomain,
    TopicShift,
};
pub use detection::{is_greeting_only, is_non_it_message, GREETING_MAX_TOKENS};
pub use errors::TriageError;
pub use intent::{classify_intent, validate_positive_intent, Intent};
pub use messages::*;
pub use question_parser::{parse_choices_from_question, MAX_PARSED_OPTIONS, MIN_PARSED_OPTIONS};
pub use session::{AnalysisSession, DEFAULT_SESSION_TTL_MINUTES, MAX_CLARIFICATION_ATTEMPTS};
pub use suggestion::{
    assess_relevance, get_suggestions, has_significant_new_info, is_context_consistent,
    RelevanceAssessment, SuggestionContext, Suggestions, RELEVANCE_THRESHOLD,
};
pub use summary::{display_value, AnalysisSummary, CategorySummary, SummaryModifications};
