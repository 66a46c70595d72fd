//! ConfirmSummaryHandler - Confirm or edit a summary, then create the ticket.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::application::responses::TriageResult;
use crate::application::session_lifecycle::SessionLifecycle;
use crate::application::ticket_finalizer::TicketFinalizer;
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::ticket::ValidationMethod;
use crate::domain::triage::{SummaryModifications, TriageError};

/// What the user did with the proposed summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmAction {
    Confirm,
    Modify,
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmAction::Confirm => write!(f, "confirm"),
            ConfirmAction::Modify => write!(f, "modify"),
        }
    }
}

impl FromStr for ConfirmAction {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirm" => Ok(ConfirmAction::Confirm),
            "modify" => Ok(ConfirmAction::Modify),
            _ => Err(TriageError::invalid_response()),
        }
    }
}

/// Command for a confirm-or-modify reply.
///
/// `modifications` is the raw edit payload; only `title` and `symptoms`
/// are accepted, anything else rejects the whole request.
#[derive(Debug, Clone)]
pub struct ConfirmSummaryCommand {
    pub session_id: SessionId,
    pub action: ConfirmAction,
    pub modifications: Option<serde_json::Value>,
}

/// Handler for confirm-or-modify replies.
pub struct ConfirmSummaryHandler {
    lifecycle: Arc<SessionLifecycle>,
    finalizer: Arc<TicketFinalizer>,
}

impl ConfirmSummaryHandler {
    pub fn new(lifecycle: Arc<SessionLifecycle>, finalizer: Arc<TicketFinalizer>) -> Self {
        Self {
            lifecycle,
            finalizer,
        }
    }

    pub async fn handle(&self, cmd: ConfirmSummaryCommand) -> Result<TriageResult, TriageError> {
        let now = Timestamp::now();
        let session = self.lifecycle.load(&cmd.session_id, now).await?;
        let mut summary = session
            .summary()
            .cloned()
            .ok_or_else(TriageError::invalid_response)?;

        let method = match cmd.action {
            ConfirmAction::Confirm => ValidationMethod::ConfirmSummaryConfirm,
            ConfirmAction::Modify => {
                let modifications = decode_modifications(cmd.modifications).map_err(|err| {
                    info!(session_id = %cmd.session_id, "Modification rejected");
                    err
                })?;
                summary.apply(&modifications);
                ValidationMethod::ConfirmSummaryModify
            }
        };

        let response = self
            .finalizer
            .finalize(&session, &summary, method, now)
            .await?;
        Ok(response.into())
    }
}

/// Reads the edit payload, rejecting unknown keys and empty edits.
fn decode_modifications(
    raw: Option<serde_json::Value>,
) -> Result<SummaryModifications, TriageError> {
    let raw = raw.ok_or_else(TriageError::invalid_modification)?;
    let modifications =
        SummaryModifications::from_value(raw).map_err(|_| TriageError::invalid_modification())?;
    if modifications.is_empty() {
        return Err(TriageError::invalid_modification());
    }
    Ok(modifications)
}
