//! AnalyzeTurnHandler - Runs one triage turn over a user message.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::responses::{AnalysisResponse, TriageResult};
use crate::application::session_lifecycle::SessionLifecycle;
use crate::application::ticket_finalizer::TicketFinalizer;
use crate::domain::catalog::{active_leaves, Category};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::triage::{
    clarification_prompt, clarification_request, detect_context, fill, get_suggestions,
    is_greeting_only, is_non_it_message, AnalysisSession, AnalysisSummary, SeedSource,
    SuggestionContext, TopicDomain, TriageAction, TriageError, AUTO_VALIDATE_MESSAGE,
    CONFIRM_SUMMARY_MESSAGE,
};
use crate::ports::{AnalysisRecord, CategoryCatalog, ClassificationRequest, Classifier};

/// Command to analyze a message, first turn or clarification reply.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeTurnCommand {
    pub message: String,
    /// Previous turn this message answers.
    pub parent_session_id: Option<SessionId>,
    pub selected_choice_id: Option<String>,
    /// Overrides the parent's stored analysis.
    pub prior_analysis: Option<AnalysisSummary>,
    pub user_email: Option<String>,
}

impl AnalyzeTurnCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: SessionId) -> Self {
        self.parent_session_id = Some(parent);
        self
    }

    pub fn with_selected_choice(mut self, choice_id: Option<String>) -> Self {
        self.selected_choice_id = choice_id;
        self
    }

    pub fn with_prior_analysis(mut self, prior: AnalysisSummary) -> Self {
        self.prior_analysis = Some(prior);
        self
    }

    pub fn with_user_email(mut self, email: Option<String>) -> Self {
        self.user_email = email;
        self
    }
}

/// Handler for triage turns.
pub struct AnalyzeTurnHandler {
    classifier: Arc<dyn Classifier>,
    catalog: Arc<dyn CategoryCatalog>,
    lifecycle: Arc<SessionLifecycle>,
    finalizer: Arc<TicketFinalizer>,
    max_attempts: u32,
    seeds: SeedSource,
}

impl AnalyzeTurnHandler {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        catalog: Arc<dyn CategoryCatalog>,
        lifecycle: Arc<SessionLifecycle>,
        finalizer: Arc<TicketFinalizer>,
        max_attempts: u32,
        seeds: SeedSource,
    ) -> Self {
        Self {
            classifier,
            catalog,
            lifecycle,
            finalizer,
            max_attempts,
            seeds,
        }
    }

    pub async fn handle(&self, cmd: AnalyzeTurnCommand) -> Result<TriageResult, TriageError> {
        let message = cmd.message.trim();
        if message.is_empty() {
            return Err(TriageError::validation(
                "message",
                "Le message ne peut pas être vide",
            ));
        }

        // 1. Early exits, no session
        if is_greeting_only(message) {
            info!("Greeting detected, no analysis");
            return Ok(AnalysisResponse::greeting().into());
        }
        // Off-topic only when no IT keyword is present alongside.
        if is_non_it_message(message) {
            info!("Off-topic message detected, no analysis");
            return Ok(AnalysisResponse::non_it().into());
        }

        let now = Timestamp::now();

        // 2. Attempt accounting
        let parent = match &cmd.parent_session_id {
            Some(id) => Some(self.lifecycle.load(id, now).await?),
            None => None,
        };
        let attempts = parent.as_ref().map(|p| p.attempts() + 1).unwrap_or(0);
        let selected_choice = cmd.selected_choice_id.or_else(|| {
            parent
                .as_ref()
                .and_then(|p| p.selected_choice_id().map(str::to_string))
        });
        let prior_analysis = cmd
            .prior_analysis
            .or_else(|| parent.as_ref().and_then(|p| p.summary().cloned()));
        let user_email = cmd
            .user_email
            .or_else(|| parent.as_ref().and_then(|p| p.user_email().map(str::to_string)));
        let previous_inputs: Vec<String> = parent
            .iter()
            .map(|p| p.original_message().to_string())
            .collect();

        if let Some(parent) = &parent {
            if attempts >= self.max_attempts {
                warn!(
                    parent_session_id = %parent.id(),
                    attempts = attempts,
                    "Max clarification attempts reached, escalating"
                );
                let response = self
                    .finalizer
                    .escalate(message, attempts, user_email.as_deref(), now)
                    .await?;
                self.lifecycle
                    .supersede(parent.id(), "max_attempts_escalation")
                    .await;
                return Ok(response.into());
            }
        }

        // 3. Context seeding
        let categories = self.catalog.list_active_categories().await?;
        let candidates = active_leaves(&categories);
        if candidates.is_empty() {
            error!("No active leaf category to classify against");
            return Err(TriageError::CategoryUnavailable);
        }
        let context_hint = detect_context(message);

        info!(
            attempts = attempts,
            context = ?context_hint.map(|c| c.as_name()),
            parent_session_id = ?cmd.parent_session_id.map(|id| id.to_string()),
            "Analysis started"
        );

        // 4. Classification
        let request = ClassificationRequest::new(message, candidates)
            .with_attempt(attempts)
            .with_prior_analysis(prior_analysis)
            .with_context_hint(context_hint)
            .with_parent_session(cmd.parent_session_id);
        let record = self.classifier.classify(&request).await.map_err(|err| {
            error!(error = %err, attempts = attempts, "Classification failed");
            TriageError::from(err)
        })?;

        // 5. Confidence gating
        let action = TriageAction::for_confidence(record.confidence);
        let summary = (action != TriageAction::TooVague)
            .then(|| record.to_summary(&categories, message));

        // 6. Persistence, then retire the parent
        let session = AnalysisSession::new(
            SessionId::new(),
            message,
            action,
            now,
            self.lifecycle.ttl_minutes(),
        )?
        .with_summary(summary.clone(), record.confidence)
        .with_user_email(user_email)
        .with_parent(cmd.parent_session_id, attempts)
        .with_selected_choice(selected_choice.clone());
        self.lifecycle.create(&session).await?;

        if let Some(parent) = &parent {
            self.lifecycle
                .supersede(parent.id(), &format!("superseded_by:{}", session.id()))
                .await;
        }

        info!(
            session_id = %session.id(),
            action = %action,
            confidence = record.confidence,
            category_id = ?record.category_id.map(|id| id.value()),
            "Analysis completed"
        );

        let turn = Turn {
            message,
            previous_inputs: &previous_inputs,
            context_hint,
            attempts,
            selected_choice: selected_choice.as_deref(),
            record: &record,
            categories: &categories,
        };
        let response = self
            .respond(action, summary.as_ref(), &turn)
            .with_session(*session.id(), *session.expires_at(), attempts)
            .with_summary(summary);

        Ok(response.into())
    }

    fn respond(
        &self,
        action: TriageAction,
        summary: Option<&AnalysisSummary>,
        turn: &Turn<'_>,
    ) -> AnalysisResponse {
        let seed = self.seeds.next_seed();
        let display = summary.map(|s| s.format_display()).unwrap_or_default();

        match action {
            TriageAction::AutoValidate => AnalysisResponse::new(
                action,
                fill(AUTO_VALIDATE_MESSAGE, &[("summary", display.as_str())]),
            ),
            TriageAction::ConfirmSummary => AnalysisResponse::new(
                action,
                fill(CONFIRM_SUMMARY_MESSAGE, &[("summary", display.as_str())]),
            ),
            _ => {
                let question = turn.record.clarification_question.as_deref();
                let suggestions = get_suggestions(
                    &SuggestionContext {
                        user_input: turn.message,
                        previous_inputs: turn.previous_inputs,
                        detected_domain: turn.context_hint,
                        confidence: turn.record.confidence,
                        attempt: turn.attempts,
                        previous_choice_id: turn.selected_choice,
                        clarification_question: question,
                        categories: turn.categories,
                    },
                    seed,
                );

                let text = if action == TriageAction::AskClarification {
                    clarification_request(question)
                } else {
                    too_vague_prompt(turn.attempts, turn.context_hint, question, seed)
                };
                AnalysisResponse::new(action, text).with_suggestions(suggestions)
            }
        }
    }
}

/// Inputs of one turn the response is built from.
struct Turn<'a> {
    message: &'a str,
    previous_inputs: &'a [String],
    context_hint: Option<TopicDomain>,
    attempts: u32,
    selected_choice: Option<&'a str>,
    record: &'a AnalysisRecord,
    categories: &'a [Category],
}

fn too_vague_prompt(
    attempts: u32,
    context_hint: Option<TopicDomain>,
    question: Option<&str>,
    seed: u64,
) -> String {
    let mut text = clarification_prompt(attempts, context_hint, seed);
    if attempts > 0 {
        if let Some(question) = question.map(str::trim).filter(|q| !q.is_empty()) {
            text.push_str("\n\n");
            text.push_str(question);
        }
    }
    text
}
