//! Integration tests for the conversational triage workflow.
//!
//! These tests drive `TriageWorkflow` end to end:
//! 1. A message is classified through `LlmClassifier` over a scripted provider
//! 2. The confidence tier decides the next request shape
//! 3. Replies convert the session into a ticket, optionally synced externally
//!
//! Uses in-memory adapters so no database, cache server or helpdesk is needed.

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

use ticket_triage::adapters::ai::{LlmClassifier, LlmClassifierConfig, MockAIProvider, MockError};
use ticket_triage::adapters::memory::{
    InMemoryCategoryCatalog, InMemorySessionRepository, InMemoryTicketRepository,
    InMemoryUserDirectory,
};
use ticket_triage::adapters::RetryPolicy;
use ticket_triage::application::{
    AnalyzeTurnCommand, AutoValidateCommand, ClarificationCommand, ConfirmAction,
    ConfirmSummaryCommand, SyncMode, TopicChoice, TopicShiftChoiceCommand, TriageDependencies,
    TriageReply, TriageResult, TriageSettings, TriageWorkflow,
};
use ticket_triage::domain::foundation::{Priority, SessionId, SessionStatus, Timestamp};
use ticket_triage::domain::ticket::ValidationMethod;
use ticket_triage::domain::triage::{SeedSource, TriageAction, TriageError};
use ticket_triage::ports::{
    ExternalTicket, ExternalTicketing, ExternalTicketingError, SessionRepository,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Helpdesk double recording every call.
#[derive(Default)]
struct RecordingExternal {
    created: Mutex<Vec<ExternalTicket>>,
    notes: Mutex<Vec<(i64, String, bool)>>,
    fail: bool,
}

impl RecordingExternal {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn created(&self) -> Vec<ExternalTicket> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalTicketing for RecordingExternal {
    async fn create_ticket(&self, ticket: &ExternalTicket) -> Result<i64, ExternalTicketingError> {
        if self.fail {
            return Err(ExternalTicketingError::http(503, "maintenance"));
        }
        let mut created = self.created.lock().unwrap();
        created.push(ticket.clone());
        Ok(4000 + created.len() as i64)
    }

    async fn add_note(
        &self,
        external_id: i64,
        text: &str,
        private: bool,
    ) -> Result<(), ExternalTicketingError> {
        self.notes
            .lock()
            .unwrap()
            .push((external_id, text.to_string(), private));
        Ok(())
    }
}

struct Fixture {
    workflow: TriageWorkflow,
    provider: MockAIProvider,
    sessions: Arc<InMemorySessionRepository>,
    tickets: Arc<InMemoryTicketRepository>,
}

impl Fixture {
    fn new() -> Self {
        Self::build(InMemoryCategoryCatalog::with_default_tree(), None)
    }

    fn with_external(external: Arc<RecordingExternal>, mode: SyncMode) -> Self {
        Self::build(
            InMemoryCategoryCatalog::with_default_tree(),
            Some((external, mode)),
        )
    }

    fn build(
        catalog: InMemoryCategoryCatalog,
        external: Option<(Arc<RecordingExternal>, SyncMode)>,
    ) -> Self {
        let provider = MockAIProvider::new();
        let classifier = LlmClassifier::new(
            Arc::new(provider.clone()),
            LlmClassifierConfig {
                retry: RetryPolicy::immediate(3),
                ..Default::default()
            },
        );
        let sessions = Arc::new(InMemorySessionRepository::new());
        let tickets = Arc::new(InMemoryTicketRepository::new(&sessions));
        let sync_mode = external.as_ref().map(|(_, m)| *m).unwrap_or_default();

        let deps = TriageDependencies {
            classifier: Arc::new(classifier),
            sessions: sessions.clone(),
            tickets: tickets.clone(),
            catalog: Arc::new(catalog),
            users: Arc::new(InMemoryUserDirectory::default()),
            external: external.map(|(e, _)| e as Arc<dyn ExternalTicketing>),
        };
        let settings = TriageSettings {
            sync_mode,
            seeds: SeedSource::Fixed(3),
            ..Default::default()
        };

        Self {
            workflow: TriageWorkflow::new(deps, settings),
            provider,
            sessions,
            tickets,
        }
    }

    async fn submit(&self, message: &str) -> Result<TriageResult, TriageError> {
        self.workflow
            .submit_message(AnalyzeTurnCommand::new(message))
            .await
    }

    async fn validate(&self, session_id: SessionId, reply: &str) -> Result<TriageResult, TriageError> {
        self.workflow
            .auto_validate(AutoValidateCommand {
                session_id,
                reply: reply.to_string(),
            })
            .await
    }

    async fn clarify(&self, session_id: SessionId, reply: &str) -> Result<TriageResult, TriageError> {
        self.workflow
            .clarify(ClarificationCommand {
                session_id,
                reply: reply.to_string(),
                selected_choice_id: None,
            })
            .await
    }

    async fn session_status(&self, id: SessionId) -> SessionStatus {
        self.sessions.find_by_id(&id).await.unwrap().unwrap().status()
    }
}

fn analysis(category: Option<i64>, confidence: f64) -> serde_json::Value {
    json!({
        "category_id": category,
        "confidence_score": confidence,
        "title": "Mot de passe oublié",
        "symptoms": ["Connexion refusée", "Mot de passe expiré"],
        "priority": "high",
        "extracted_info": {"application": "Windows"},
        "missing_info": [],
        "clarification_question": null
    })
}

fn vague() -> serde_json::Value {
    json!({
        "category_id": null,
        "confidence_score": 0.2,
        "title": "Problème non précisé",
        "symptoms": ["Dysfonctionnement"],
        "priority": "medium",
        "clarification_question": "Quel appareil ou logiciel est concerné ?"
    })
}

fn session_of(result: &TriageResult) -> SessionId {
    result.session_id().expect("analysis should carry a session")
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn password_reset_is_auto_validated_with_ok() {
    let fixture = Fixture::new();
    fixture.provider.push_response(analysis(Some(10), 0.99).to_string());

    let first = fixture.submit("mot de passe oublié").await.unwrap();
    assert_eq!(first.action(), Some(TriageAction::AutoValidate));

    let result = fixture.validate(session_of(&first), "ok").await.unwrap();
    let ticket = result.as_ticket().unwrap();
    assert_eq!(ticket.priority, Priority::High);
    assert_eq!(ticket.title, "Mot de passe oublié");
    assert!(ticket.category_name.is_some());
    assert_eq!(
        ticket.ticket_number,
        format!("TKT-{}-00001", Timestamp::now().year())
    );

    let stored = fixture.tickets.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].validation_method(), ValidationMethod::AutoValidate);
    assert_eq!(
        fixture.session_status(session_of(&first)).await,
        SessionStatus::Converted
    );
}

#[tokio::test]
async fn auto_validate_replay_is_rejected() {
    let fixture = Fixture::new();
    fixture.provider.push_response(analysis(Some(10), 0.99).to_string());
    let first = fixture.submit("mot de passe oublié").await.unwrap();
    let session_id = session_of(&first);

    fixture.validate(session_id, "oui").await.unwrap();
    let replay = fixture.validate(session_id, "oui").await;

    let reply = TriageWorkflow::respond(replay);
    match reply {
        TriageReply::Error(err) => assert_eq!(err.error_code, "SESSION_ALREADY_CONVERTED"),
        other => panic!("expected an error, got {:?}", other),
    }
    assert_eq!(fixture.tickets.all().await.len(), 1);
}

#[tokio::test]
async fn concurrent_validations_create_one_ticket() {
    let fixture = Fixture::new();
    fixture.provider.push_response(analysis(Some(10), 0.99).to_string());
    let first = fixture.submit("mot de passe oublié").await.unwrap();
    let session_id = session_of(&first);

    let (a, b) = tokio::join!(
        fixture.validate(session_id, "oui"),
        fixture.validate(session_id, "ok")
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, Err(TriageError::SessionAlreadyConverted(id)) if *id == session_id)));
    assert_eq!(fixture.tickets.all().await.len(), 1);
    assert_eq!(fixture.session_status(session_id).await, SessionStatus::Converted);
}

#[tokio::test]
async fn late_clarification_leaves_converted_session_intact() {
    let fixture = Fixture::new();
    fixture.provider.push_response(analysis(Some(10), 0.85).to_string());
    let first = fixture.submit("mot de passe oublié depuis hier").await.unwrap();
    let session_id = session_of(&first);

    fixture
        .workflow
        .confirm_or_modify(ConfirmSummaryCommand {
            session_id,
            action: ConfirmAction::Confirm,
            modifications: None,
        })
        .await
        .unwrap();

    let late = fixture.clarify(session_id, "en fait c'est sur le portail").await;
    assert!(matches!(late, Err(TriageError::SessionAlreadyConverted(_))));

    let stored = fixture.sessions.find_by_id(&session_id).await.unwrap().unwrap();
    assert_eq!(stored.status(), SessionStatus::Converted);
    assert!(stored.ticket_id().is_some());
    assert_eq!(fixture.tickets.all().await.len(), 1);
}

#[tokio::test]
async fn two_word_message_is_too_vague() {
    let fixture = Fixture::new();
    fixture.provider.push_response(vague().to_string());

    let result = fixture.submit("ça bug").await.unwrap();

    let analysis = result.as_analysis().unwrap();
    assert_eq!(analysis.action, TriageAction::TooVague);
    assert!(analysis.summary.is_none());
    assert!(analysis.guided_choices.as_ref().unwrap().len() >= 2);
    assert!(analysis.suggestion_metadata.is_some());
    assert!(fixture.tickets.all().await.is_empty());
}

#[tokio::test]
async fn priority_modification_is_rejected() {
    let fixture = Fixture::new();
    fixture.provider.push_response(analysis(Some(10), 0.85).to_string());
    let first = fixture.submit("mot de passe oublié depuis hier").await.unwrap();
    assert_eq!(first.action(), Some(TriageAction::ConfirmSummary));

    let outcome = fixture
        .workflow
        .confirm_or_modify(ConfirmSummaryCommand {
            session_id: session_of(&first),
            action: ConfirmAction::Modify,
            modifications: Some(json!({"title": "Urgent", "priority": "critical"})),
        })
        .await;

    assert!(matches!(outcome, Err(TriageError::InvalidUserResponse(_))));
    assert!(fixture.tickets.all().await.is_empty());
}

#[tokio::test]
async fn confirm_summary_modify_creates_edited_ticket() {
    let fixture = Fixture::new();
    fixture.provider.push_response(analysis(Some(10), 0.85).to_string());
    let first = fixture.submit("mot de passe oublié depuis hier").await.unwrap();

    let result = fixture
        .workflow
        .confirm_or_modify(ConfirmSummaryCommand {
            session_id: session_of(&first),
            action: ConfirmAction::Modify,
            modifications: Some(json!({"title": "Compte bloqué après trois essais"})),
        })
        .await
        .unwrap();

    assert_eq!(
        result.as_ticket().unwrap().title,
        "Compte bloqué après trois essais"
    );
    let stored = fixture.tickets.all().await;
    assert_eq!(stored[0].validation_method(), ValidationMethod::ConfirmSummaryModify);
}

#[tokio::test]
async fn unresolved_clarifications_escalate_to_a_human() {
    let fixture = Fixture::new();
    let provider = fixture.provider.clone();
    for _ in 0..3 {
        provider.push_response(vague().to_string());
    }

    let mut current = fixture.submit("ça bug").await.unwrap();
    let replies = ["toujours pareil", "je ne sais pas", "ça ne marche toujours pas"];
    for (turn, reply) in replies.iter().enumerate() {
        let session_id = session_of(&current);
        current = fixture.clarify(session_id, reply).await.unwrap();
        if turn < 2 {
            assert_eq!(current.action(), Some(TriageAction::TooVague));
            assert_eq!(
                current.as_analysis().unwrap().clarification_attempts,
                turn as u32 + 1
            );
        }
    }

    let ticket = current.as_ticket().expect("third reply should escalate");
    assert_eq!(ticket.escalated_to_human, Some(true));
    assert!(!ticket.ready_for_l1);
    assert_eq!(provider.call_count(), 3);

    let stored = fixture.tickets.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].validation_method(), ValidationMethod::MaxAttemptsEscalation);
    assert_eq!(stored[0].priority(), Priority::High);
}

#[tokio::test]
async fn ticket_numbers_increase_within_a_year() {
    let fixture = Fixture::new();
    let year = Timestamp::now().year();
    let mut numbers = Vec::new();

    for message in ["mot de passe oublié", "mot de passe expiré"] {
        fixture.provider.push_response(analysis(Some(10), 0.99).to_string());
        let first = fixture.submit(message).await.unwrap();
        let ticket = fixture.validate(session_of(&first), "ok").await.unwrap();
        numbers.push(ticket.as_ticket().unwrap().ticket_number.clone());
    }

    assert_eq!(
        numbers,
        [
            format!("TKT-{}-00001", year),
            format!("TKT-{}-00002", year)
        ]
    );
}

#[tokio::test]
async fn provider_outage_fails_without_leaving_a_session() {
    let fixture = Fixture::new();
    for _ in 0..3 {
        fixture.provider.push_error(MockError::Unavailable {
            message: "overloaded".to_string(),
        });
    }

    let outcome = fixture.submit("mon imprimante ne marche plus").await;

    assert!(matches!(outcome, Err(TriageError::ClassificationFailure(_))));
    assert_eq!(fixture.provider.call_count(), 3);
    assert!(fixture.sessions.is_empty().await);
}

#[tokio::test]
async fn malformed_answer_is_not_retried() {
    let fixture = Fixture::new();
    fixture.provider.push_response("Je pense que c'est un problème de réseau.");

    let outcome = fixture.submit("mon wifi ne marche plus").await;

    assert!(matches!(outcome, Err(TriageError::ClassificationFailure(_))));
    assert_eq!(fixture.provider.call_count(), 1);
}

#[tokio::test]
async fn greeting_needs_no_classifier() {
    let fixture = Fixture::new();

    let result = fixture.submit("Bonjour").await.unwrap();

    let analysis = result.as_analysis().unwrap();
    assert_eq!(analysis.action, TriageAction::Greeting);
    assert_eq!(analysis.show_examples, Some(true));
    assert_eq!(fixture.provider.call_count(), 0);
}

#[tokio::test]
async fn empty_catalog_is_reported() {
    let fixture = Fixture::build(InMemoryCategoryCatalog::empty(), None);

    let reply = TriageWorkflow::respond(fixture.submit("mon wifi ne marche plus").await);

    match reply {
        TriageReply::Error(err) => assert_eq!(err.error_code, "CATEGORY_UNAVAILABLE"),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[tokio::test]
async fn ambiguous_topic_change_lets_the_user_choose() {
    let fixture = Fixture::new();
    fixture.provider.push_response(analysis(Some(14), 0.5).to_string());
    let first = fixture.submit("outlook ne s'ouvre plus").await.unwrap();
    assert_eq!(first.action(), Some(TriageAction::AskClarification));

    let choice = fixture
        .clarify(session_of(&first), "le wifi est coupé")
        .await
        .unwrap();
    assert_eq!(choice.action(), Some(TriageAction::TopicShift));
    assert_eq!(fixture.provider.call_count(), 1);

    fixture.provider.push_response(analysis(Some(18), 0.8).to_string());
    let result = fixture
        .workflow
        .choose_topic(TopicShiftChoiceCommand {
            session_id: session_of(&choice),
            choice: TopicChoice::KeepNew,
        })
        .await
        .unwrap();

    assert_eq!(result.action(), Some(TriageAction::ConfirmSummary));
    assert_eq!(
        fixture.session_status(session_of(&choice)).await,
        SessionStatus::Invalidated
    );
}

// =============================================================================
// External sync
// =============================================================================

#[tokio::test]
async fn dual_mode_pushes_ticket_and_note() {
    let external = Arc::new(RecordingExternal::default());
    let fixture = Fixture::with_external(external.clone(), SyncMode::Dual);
    fixture.provider.push_response(analysis(Some(10), 0.99).to_string());

    let first = fixture.submit("mot de passe oublié").await.unwrap();
    let result = fixture.validate(session_of(&first), "ok").await.unwrap();

    let ticket = result.as_ticket().unwrap();
    assert_eq!(ticket.external_ticket_id, Some(4001));
    assert!(ticket.synced_to_external);

    let created = external.created();
    assert_eq!(created.len(), 1);
    assert!(created[0].description.contains("mot de passe oublié"));
    let notes = external.notes.lock().unwrap().clone();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].2, "analysis note should be private");
}

#[tokio::test]
async fn dual_mode_keeps_local_ticket_when_helpdesk_is_down() {
    let external = Arc::new(RecordingExternal::failing());
    let fixture = Fixture::with_external(external, SyncMode::Dual);
    fixture.provider.push_response(analysis(Some(10), 0.99).to_string());

    let first = fixture.submit("mot de passe oublié").await.unwrap();
    let result = fixture.validate(session_of(&first), "ok").await.unwrap();

    let ticket = result.as_ticket().unwrap();
    assert!(ticket.external_ticket_id.is_none());
    assert!(!ticket.synced_to_external);
    assert_eq!(fixture.tickets.all().await.len(), 1);
}

#[tokio::test]
async fn glpi_only_mode_aborts_before_local_write() {
    let external = Arc::new(RecordingExternal::failing());
    let fixture = Fixture::with_external(external, SyncMode::GlpiOnly);
    fixture.provider.push_response(analysis(Some(10), 0.99).to_string());

    let first = fixture.submit("mot de passe oublié").await.unwrap();
    let outcome = fixture.validate(session_of(&first), "ok").await;

    assert!(matches!(outcome, Err(TriageError::ExternalSyncFailed(_))));
    assert!(fixture.tickets.all().await.is_empty());
    assert_eq!(
        fixture.session_status(session_of(&first)).await,
        SessionStatus::Pending
    );
}

#[tokio::test]
async fn escalation_survives_helpdesk_outage_in_glpi_only_mode() {
    let external = Arc::new(RecordingExternal::failing());
    let fixture = Fixture::with_external(external, SyncMode::GlpiOnly);
    for _ in 0..3 {
        fixture.provider.push_response(vague().to_string());
    }

    let mut current = fixture.submit("ça bug").await.unwrap();
    for reply in ["toujours pareil", "je ne sais pas", "rien ne marche"] {
        current = fixture.clarify(session_of(&current), reply).await.unwrap();
    }

    let ticket = current.as_ticket().unwrap();
    assert_eq!(ticket.escalated_to_human, Some(true));
    assert!(!ticket.synced_to_external);
}
