//! Tags recording which workflow path produced a ticket.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMethod {
    /// One-word confirmation of a high-confidence summary.
    AutoValidate,
    ConfirmSummaryConfirm,
    ConfirmSummaryModify,
    /// Clarification loop exhausted; handed to a human.
    MaxAttemptsEscalation,
}

impl ValidationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMethod::AutoValidate => "auto_validate",
            ValidationMethod::ConfirmSummaryConfirm => "confirm_summary_confirm",
            ValidationMethod::ConfirmSummaryModify => "confirm_summary_modify",
            ValidationMethod::MaxAttemptsEscalation => "max_attempts_escalation",
        }
    }

    /// True when the user validated the summary themselves.
    pub fn is_user_validated(&self) -> bool {
        !matches!(self, ValidationMethod::MaxAttemptsEscalation)
    }
}

impl fmt::Display for ValidationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ValidationMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_validate" => Ok(ValidationMethod::AutoValidate),
            "confirm_summary_confirm" => Ok(ValidationMethod::ConfirmSummaryConfirm),
            "confirm_summary_modify" => Ok(ValidationMethod::ConfirmSummaryModify),
            "max_attempts_escalation" => Ok(ValidationMethod::MaxAttemptsEscalation),
            other => Err(ValidationError::invalid_format(
                "validation_method",
                format!("unknown validation method '{}'", other),
            )),
        }
    }
}
