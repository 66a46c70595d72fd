//! TriageWorkflow - Entry point for every inbound conversational request.
//!
//! Wires the handlers over one shared set of ports. Transport layers call
//! the typed methods and turn the outcome into a payload with [`respond`].
//!
//! [`respond`]: TriageWorkflow::respond

use std::sync::Arc;

use tracing::{error, info, warn};

use super::handlers::{
    AnalyzeTurnCommand, AnalyzeTurnHandler, AutoValidateCommand, AutoValidateHandler,
    ClarificationCommand, ClarificationHandler, ConfirmSummaryCommand, ConfirmSummaryHandler,
    TopicShiftChoiceCommand, TopicShiftChoiceHandler,
};
use super::responses::{ErrorResponse, TriageReply, TriageResult};
use super::session_lifecycle::SessionLifecycle;
use super::ticket_finalizer::{SyncMode, TicketFinalizer};
use crate::domain::triage::{
    SeedSource, TriageError, DEFAULT_SESSION_TTL_MINUTES, MAX_CLARIFICATION_ATTEMPTS,
};
use crate::ports::{
    CategoryCatalog, Classifier, ExternalTicketing, SessionRepository, TicketRepository,
    UserDirectory,
};

/// Ports the workflow runs on.
#[derive(Clone)]
pub struct TriageDependencies {
    pub classifier: Arc<dyn Classifier>,
    pub sessions: Arc<dyn SessionRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub catalog: Arc<dyn CategoryCatalog>,
    pub users: Arc<dyn UserDirectory>,
    /// Ticket-of-record system, if one is configured.
    pub external: Option<Arc<dyn ExternalTicketing>>,
}

/// Tunables of the workflow.
#[derive(Debug, Clone, Copy)]
pub struct TriageSettings {
    pub session_ttl_minutes: i64,
    pub max_clarification_attempts: u32,
    pub sync_mode: SyncMode,
    pub seeds: SeedSource,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            max_clarification_attempts: MAX_CLARIFICATION_ATTEMPTS,
            sync_mode: SyncMode::default(),
            seeds: SeedSource::Random,
        }
    }
}

/// The conversational triage workflow.
pub struct TriageWorkflow {
    analyze: Arc<AnalyzeTurnHandler>,
    auto_validate: AutoValidateHandler,
    confirm: ConfirmSummaryHandler,
    clarification: ClarificationHandler,
    topic_shift: TopicShiftChoiceHandler,
}

impl TriageWorkflow {
    pub fn new(deps: TriageDependencies, settings: TriageSettings) -> Self {
        let lifecycle = Arc::new(SessionLifecycle::new(
            deps.sessions.clone(),
            settings.session_ttl_minutes,
        ));

        let mut finalizer = TicketFinalizer::new(
            deps.tickets.clone(),
            deps.catalog.clone(),
            deps.users.clone(),
        );
        if let Some(external) = deps.external.clone() {
            finalizer = finalizer.with_external(external, settings.sync_mode);
        }
        let finalizer = Arc::new(finalizer);

        let analyze = Arc::new(AnalyzeTurnHandler::new(
            deps.classifier.clone(),
            deps.catalog.clone(),
            lifecycle.clone(),
            finalizer.clone(),
            settings.max_clarification_attempts,
            settings.seeds,
        ));

        info!(
            external_sync = deps.external.is_some(),
            sync_mode = finalizer.sync_mode().as_str(),
            max_attempts = settings.max_clarification_attempts,
            "Triage workflow ready"
        );

        Self {
            auto_validate: AutoValidateHandler::new(lifecycle.clone(), finalizer.clone()),
            confirm: ConfirmSummaryHandler::new(lifecycle.clone(), finalizer.clone()),
            clarification: ClarificationHandler::new(
                lifecycle.clone(),
                analyze.clone(),
                settings.seeds,
            ),
            topic_shift: TopicShiftChoiceHandler::new(lifecycle, analyze.clone()),
            analyze,
        }
    }

    /// A new message, or a guided-choice pick chained to a previous turn.
    pub async fn submit_message(
        &self,
        cmd: AnalyzeTurnCommand,
    ) -> Result<TriageResult, TriageError> {
        self.analyze.handle(cmd).await
    }

    pub async fn auto_validate(
        &self,
        cmd: AutoValidateCommand,
    ) -> Result<TriageResult, TriageError> {
        self.auto_validate.handle(cmd).await
    }

    pub async fn confirm_or_modify(
        &self,
        cmd: ConfirmSummaryCommand,
    ) -> Result<TriageResult, TriageError> {
        self.confirm.handle(cmd).await
    }

    pub async fn clarify(&self, cmd: ClarificationCommand) -> Result<TriageResult, TriageError> {
        self.clarification.handle(cmd).await
    }

    pub async fn choose_topic(
        &self,
        cmd: TopicShiftChoiceCommand,
    ) -> Result<TriageResult, TriageError> {
        self.topic_shift.handle(cmd).await
    }

    /// Turns an outcome into the payload sent back to the user.
    ///
    /// Errors never escape: each one becomes an `ErrorResponse` carrying
    /// its code and French message.
    pub fn respond(outcome: Result<TriageResult, TriageError>) -> TriageReply {
        match outcome {
            Ok(result) => TriageReply::Result(result),
            Err(err) => {
                match &err {
                    TriageError::Infrastructure(_) | TriageError::ExternalSyncFailed(_) => {
                        error!(error = %err, code = %err.code(), "Triage request failed");
                    }
                    TriageError::ClassificationFailure(_) | TriageError::CategoryUnavailable => {
                        warn!(error = %err, code = %err.code(), "Triage request failed");
                    }
                    _ => {
                        info!(code = %err.code(), "Triage request rejected");
                    }
                }
                TriageReply::Error(ErrorResponse::from(&err))
            }
        }
    }
}

impl std::fmt::Debug for TriageWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageWorkflow").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;

    #[test]
    fn default_settings_follow_workflow_constants() {
        let settings = TriageSettings::default();
        assert_eq!(settings.session_ttl_minutes, 30);
        assert_eq!(settings.max_clarification_attempts, 3);
        assert_eq!(settings.sync_mode, SyncMode::Dual);
    }

    #[test]
    fn respond_maps_errors_to_payloads() {
        let reply = TriageWorkflow::respond(Err(TriageError::not_found(SessionId::new())));
        assert!(reply.is_error());
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["error_code"], "SESSION_NOT_FOUND");
    }

    #[test]
    fn respond_passes_results_through() {
        let reply = TriageWorkflow::respond(Ok(
            crate::application::responses::AnalysisResponse::greeting().into(),
        ));
        assert!(!reply.is_error());
        assert_eq!(serde_json::to_value(&reply).unwrap()["action"], "greeting");
    }
}
