//! SessionStatus enum for tracking lifecycle of analysis sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Lifecycle status of an analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Expired,
    Invalidated,
    #[serde(rename = "converted_to_ticket")]
    Converted,
}

impl SessionStatus {
    /// Returns true if the session still awaits a user reply.
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionStatus::Pending)
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Validates a transition from this status to another.
    ///
    /// Valid transitions:
    /// - Pending -> Expired
    /// - Pending -> Invalidated
    /// - Pending -> Converted
    pub fn can_transition_to(&self, target: &SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Pending, Expired) | (Pending, Invalidated) | (Pending, Converted)
        )
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Expired => "expired",
            SessionStatus::Invalidated => "invalidated",
            SessionStatus::Converted => "converted_to_ticket",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            // Legacy rows stored vague sessions under their own status.
            "too_vague" => Ok(SessionStatus::Pending),
            "expired" => Ok(SessionStatus::Expired),
            "invalidated" => Ok(SessionStatus::Invalidated),
            "converted_to_ticket" => Ok(SessionStatus::Converted),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown session status '{}'", other),
            )),
        }
    }
}
