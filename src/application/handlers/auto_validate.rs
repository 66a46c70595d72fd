//! AutoValidateHandler - Turns a one-word confirmation into a ticket.

use std::sync::Arc;

use tracing::info;

use crate::application::responses::TriageResult;
use crate::application::session_lifecycle::SessionLifecycle;
use crate::application::ticket_finalizer::TicketFinalizer;
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::ticket::ValidationMethod;
use crate::domain::triage::{validate_positive_intent, TriageError};

/// Command carrying the user's reply to an auto-validate prompt.
#[derive(Debug, Clone)]
pub struct AutoValidateCommand {
    pub session_id: SessionId,
    pub reply: String,
}

/// Handler for auto-validate replies.
pub struct AutoValidateHandler {
    lifecycle: Arc<SessionLifecycle>,
    finalizer: Arc<TicketFinalizer>,
}

impl AutoValidateHandler {
    pub fn new(lifecycle: Arc<SessionLifecycle>, finalizer: Arc<TicketFinalizer>) -> Self {
        Self {
            lifecycle,
            finalizer,
        }
    }

    /// Creates the ticket from the stored summary when the reply is a clear yes.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` / `SessionAlreadyConverted` from loading
    /// - `InvalidUserResponse` if the reply is not a positive confirmation,
    ///   or the session holds no summary
    pub async fn handle(&self, cmd: AutoValidateCommand) -> Result<TriageResult, TriageError> {
        let now = Timestamp::now();
        let session = self.lifecycle.load(&cmd.session_id, now).await?;

        if !validate_positive_intent(&cmd.reply) {
            info!(session_id = %cmd.session_id, "Reply not read as a confirmation");
            return Err(TriageError::invalid_response());
        }

        let summary = session.summary().cloned().ok_or_else(|| {
            info!(session_id = %cmd.session_id, "Nothing to validate on this session");
            TriageError::invalid_response()
        })?;

        let response = self
            .finalizer
            .finalize(&session, &summary, ValidationMethod::AutoValidate, now)
            .await?;
        Ok(response.into())
    }
}
