//! Actions the workflow can take after a turn, and the confidence gates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// At or above this confidence the summary only needs a one-word "ok".
pub const AUTO_VALIDATE_THRESHOLD: f64 = 0.98;

/// At or above this confidence the user confirms or edits the summary.
pub const CONFIRM_SUMMARY_THRESHOLD: f64 = 0.70;

/// At or above this confidence the workflow asks a targeted question.
pub const ASK_CLARIFICATION_THRESHOLD: f64 = 0.40;

/// Action chosen for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageAction {
    AutoValidate,
    ConfirmSummary,
    AskClarification,
    TooVague,
    /// The user must say which of two problems to pursue.
    TopicShift,
    Greeting,
    NonIt,
}

impl TriageAction {
    /// Maps a confidence to its tier. Thresholds are inclusive lower bounds.
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence >= AUTO_VALIDATE_THRESHOLD {
            TriageAction::AutoValidate
        } else if confidence >= CONFIRM_SUMMARY_THRESHOLD {
            TriageAction::ConfirmSummary
        } else if confidence >= ASK_CLARIFICATION_THRESHOLD {
            TriageAction::AskClarification
        } else {
            TriageAction::TooVague
        }
    }

    /// True for actions that await a clarification reply.
    pub fn expects_clarification(&self) -> bool {
        matches!(self, TriageAction::AskClarification | TriageAction::TooVague)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriageAction::AutoValidate => "auto_validate",
            TriageAction::ConfirmSummary => "confirm_summary",
            TriageAction::AskClarification => "ask_clarification",
            TriageAction::TooVague => "too_vague",
            TriageAction::TopicShift => "topic_shift",
            TriageAction::Greeting => "greeting",
            TriageAction::NonIt => "non_it",
        }
    }
}

impl fmt::Display for TriageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TriageAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_validate" => Ok(TriageAction::AutoValidate),
            "confirm_summary" => Ok(TriageAction::ConfirmSummary),
            "ask_clarification" => Ok(TriageAction::AskClarification),
            "too_vague" => Ok(TriageAction::TooVague),
            "topic_shift" => Ok(TriageAction::TopicShift),
            "greeting" => Ok(TriageAction::Greeting),
            "non_it" => Ok(TriageAction::NonIt),
            other => Err(ValidationError::invalid_format(
                "action",
                format!("unknown action '{}'", other),
            )),
        }
    }
}
