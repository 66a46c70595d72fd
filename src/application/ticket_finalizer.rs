//! Ticket finalization: numbering, persistence, external sync.
//!
//! Two entry points exist. `finalize` turns a validated session summary into
//! a ticket and converts the session in the same unit of work. `escalate`
//! hands a runaway clarification loop to a human and cannot be refused by
//! the catalog or the external system.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::responses::TicketCreatedResponse;
use crate::domain::catalog::UNCATEGORIZED_NAME;
use crate::domain::foundation::{
    CategoryId, ErrorCode, Priority, SessionId, TicketId, Timestamp, UserId,
};
use crate::domain::ticket::{
    analysis_note, build_description, escalation_description, escalation_title,
    external_description, ExternalLink, NewTicket, Ticket, TicketNumber, ValidationMethod,
    UNTITLED_TICKET,
};
use crate::domain::triage::{
    fill, AnalysisSession, AnalysisSummary, TriageError, MAX_ATTEMPTS_MESSAGE,
    TICKET_CREATED_EXTERNAL_MESSAGE, TICKET_CREATED_MESSAGE,
};
use crate::ports::{
    CategoryCatalog, ExternalTicket, ExternalTicketing, ExternalTicketingError, TicketRepository,
    UserDirectory,
};

/// How many numbers are tried before a collision is reported.
const MAX_NUMBERING_ATTEMPTS: u32 = 5;

/// Where the ticket of record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Local ticket always; the external copy is best-effort.
    #[default]
    Dual,
    /// The external system must accept the ticket before anything is stored.
    #[serde(alias = "external_only")]
    GlpiOnly,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Dual => "dual",
            SyncMode::GlpiOnly => "glpi_only",
        }
    }
}

/// Creates tickets from sessions.
pub struct TicketFinalizer {
    tickets: Arc<dyn TicketRepository>,
    catalog: Arc<dyn CategoryCatalog>,
    users: Arc<dyn UserDirectory>,
    external: Option<Arc<dyn ExternalTicketing>>,
    sync_mode: SyncMode,
}

impl TicketFinalizer {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        catalog: Arc<dyn CategoryCatalog>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            tickets,
            catalog,
            users,
            external: None,
            sync_mode: SyncMode::Dual,
        }
    }

    /// Enables external sync.
    pub fn with_external(mut self, external: Arc<dyn ExternalTicketing>, mode: SyncMode) -> Self {
        self.external = Some(external);
        self.sync_mode = mode;
        self
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Creates the ticket for a validated summary and converts `session`.
    ///
    /// The summary must come from the stored session, possibly edited
    /// through the title/symptoms whitelist.
    ///
    /// # Errors
    ///
    /// - `SessionAlreadyConverted` if another request converted the session first
    /// - `ExternalSyncFailed` in `GlpiOnly` mode when the external system refuses
    /// - `Infrastructure` on storage failure
    pub async fn finalize(
        &self,
        session: &AnalysisSession,
        summary: &AnalysisSummary,
        method: ValidationMethod,
        now: Timestamp,
    ) -> Result<TicketCreatedResponse, TriageError> {
        let title = summary
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED_TICKET)
            .to_string();
        let description = build_description(&summary.symptoms, &summary.extracted_info);
        let confidence = session.confidence().unwrap_or_else(|| summary.confidence());
        let priority = summary.priority.unwrap_or_default();

        let mut draft = NewTicket {
            title,
            description,
            original_message: session.original_message().to_string(),
            priority,
            category_id: summary.category_id(),
            created_by: self.resolve_requester(session.user_email()).await,
            confidence,
            symptoms: summary.symptoms.clone(),
            validation_method: method,
            ready_for_l1: true,
            external: None,
        };

        draft.external = match (&self.external, self.sync_mode) {
            (None, _) => None,
            (Some(external), SyncMode::GlpiOnly) => Some(
                self.push_external(external.as_ref(), &draft, session.user_email())
                    .await
                    .map_err(|err| {
                        error!(session_id = %session.id(), error = %err, "External ticket creation failed");
                        TriageError::ExternalSyncFailed(err.to_string())
                    })?,
            ),
            (Some(external), SyncMode::Dual) => {
                match self
                    .push_external(external.as_ref(), &draft, session.user_email())
                    .await
                {
                    Ok(link) => Some(link),
                    Err(err) => {
                        warn!(session_id = %session.id(), error = %err, "External sync failed, keeping local ticket only");
                        None
                    }
                }
            }
        };

        let ticket = self.insert_numbered(draft, Some(session.id()), now).await?;

        let category_name = match summary.category.as_ref().and_then(|c| c.name.clone()) {
            Some(name) => Some(name),
            None => self.category_name(ticket.category_id()).await,
        };

        info!(
            ticket_id = %ticket.id(),
            ticket_number = %ticket.number(),
            session_id = %session.id(),
            validation_method = %method,
            external_id = ?ticket.external_id(),
            "Ticket created"
        );

        let message = confirmation_message(&ticket, category_name.as_deref());
        Ok(TicketCreatedResponse::from_ticket(&ticket, category_name, message))
    }

    /// Creates a ticket for a human to pick up after too many clarification turns.
    ///
    /// Bypasses classification. Catalog and external-system failures are
    /// logged and skipped, so only a storage failure can make this fail.
    pub async fn escalate(
        &self,
        message: &str,
        attempts: u32,
        user_email: Option<&str>,
        now: Timestamp,
    ) -> Result<TicketCreatedResponse, TriageError> {
        let bucket = match self.catalog.ensure_uncategorized().await {
            Ok(bucket) => Some(bucket),
            Err(err) => {
                warn!(error = %err, "Uncategorized bucket unavailable, escalating without category");
                None
            }
        };

        let mut draft = NewTicket {
            title: escalation_title(message),
            description: escalation_description(message, attempts),
            original_message: message.to_string(),
            priority: Priority::High,
            category_id: bucket.as_ref().map(|b| b.id),
            created_by: self.resolve_requester(user_email).await,
            confidence: 0.0,
            symptoms: Vec::new(),
            validation_method: ValidationMethod::MaxAttemptsEscalation,
            ready_for_l1: false,
            external: None,
        };

        if let Some(external) = &self.external {
            match self.push_external(external.as_ref(), &draft, user_email).await {
                Ok(link) => draft.external = Some(link),
                Err(err) => warn!(error = %err, "External sync of escalation failed"),
            }
        }

        let ticket = self.insert_numbered(draft, None, now).await?;

        info!(
            ticket_id = %ticket.id(),
            ticket_number = %ticket.number(),
            attempts = attempts,
            "Clarification loop escalated to a human"
        );

        let text = fill(
            MAX_ATTEMPTS_MESSAGE,
            &[("ticket_number", ticket.number().to_string().as_str())],
        );
        let category_name = bucket
            .map(|b| b.name)
            .or_else(|| Some(UNCATEGORIZED_NAME.to_string()));
        Ok(TicketCreatedResponse::from_ticket(&ticket, category_name, text).escalated())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════

    /// Numbers and stores the ticket, retrying when a concurrent writer took the number.
    async fn insert_numbered(
        &self,
        draft: NewTicket,
        session_id: Option<&SessionId>,
        now: Timestamp,
    ) -> Result<Ticket, TriageError> {
        let year = now.year();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let max_sequence = self.tickets.max_sequence_for_year(year).await?;
            let number = TicketNumber::next(year, max_sequence);
            let ticket = Ticket::create(TicketId::new(), number, draft.clone(), now)?;

            let stored = match session_id {
                Some(session_id) => {
                    self.tickets
                        .insert_and_convert(&ticket, session_id, now)
                        .await
                }
                None => self.tickets.insert(&ticket).await,
            };

            match stored {
                Ok(()) => return Ok(ticket),
                Err(err)
                    if err.code == ErrorCode::DuplicateTicketNumber
                        && attempt < MAX_NUMBERING_ATTEMPTS =>
                {
                    warn!(ticket_number = %ticket.number(), attempt = attempt, "Ticket number taken, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn push_external(
        &self,
        external: &dyn ExternalTicketing,
        draft: &NewTicket,
        requester_email: Option<&str>,
    ) -> Result<ExternalLink, ExternalTicketingError> {
        let request = ExternalTicket {
            title: draft.title.clone(),
            description: external_description(&draft.description, &draft.original_message),
            category_id: draft.category_id,
            priority: draft.priority,
            requester_email: requester_email.map(str::to_string),
        };
        let external_id = external.create_ticket(&request).await?;

        let note = analysis_note(draft.confidence, draft.validation_method, &draft.symptoms);
        if let Err(err) = external.add_note(external_id, &note, true).await {
            warn!(external_id = external_id, error = %err, "Failed to attach analysis note");
        }

        Ok(ExternalLink {
            external_id,
            synced_at: Timestamp::now(),
        })
    }

    async fn resolve_requester(&self, email: Option<&str>) -> Option<UserId> {
        let email = email?;
        match self.users.find_user_by_email(email).await {
            Ok(user) => user.map(|u| u.id),
            Err(err) => {
                warn!(error = %err, "User lookup failed, ticket left without requester");
                None
            }
        }
    }

    async fn category_name(&self, id: Option<CategoryId>) -> Option<String> {
        match self.catalog.find_by_id(id?).await {
            Ok(category) => category.map(|c| c.name),
            Err(err) => {
                warn!(error = %err, "Category lookup failed");
                None
            }
        }
    }
}

fn confirmation_message(ticket: &Ticket, category_name: Option<&str>) -> String {
    let number = ticket.number().to_string();
    let category = category_name.unwrap_or(UNCATEGORIZED_NAME);
    let priority = ticket.priority().label();

    match ticket.external_id() {
        Some(external_id) => fill(
            TICKET_CREATED_EXTERNAL_MESSAGE,
            &[
                ("ticket_number", number.as_str()),
                ("external_id", external_id.to_string().as_str()),
                ("category", category),
                ("priority", priority.as_str()),
            ],
        ),
        None => fill(
            TICKET_CREATED_MESSAGE,
            &[
                ("ticket_number", number.as_str()),
                ("category", category),
                ("priority", priority.as_str()),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryCategoryCatalog, InMemorySessionRepository, InMemoryTicketRepository,
        InMemoryUserDirectory,
    };
    use crate::domain::catalog::{User, UNCATEGORIZED_ABBREVIATION};
    use crate::domain::foundation::SessionStatus;
    use crate::domain::triage::{CategorySummary, TriageAction};
    use crate::ports::{CategoryCatalog as _, SessionRepository as _};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockExternal {
        created: Mutex<Vec<ExternalTicket>>,
        notes: Mutex<Vec<(i64, String, bool)>>,
        fail: bool,
    }

    impl MockExternal {
        fn new() -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                notes: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl ExternalTicketing for MockExternal {
        async fn create_ticket(
            &self,
            ticket: &ExternalTicket,
        ) -> Result<i64, ExternalTicketingError> {
            if self.fail {
                return Err(ExternalTicketingError::Network("connection refused".into()));
            }
            let mut created = self.created.lock().unwrap();
            created.push(ticket.clone());
            Ok(1000 + created.len() as i64)
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
        sessions: Arc<InMemorySessionRepository>,
        tickets: Arc<InMemoryTicketRepository>,
        catalog: Arc<InMemoryCategoryCatalog>,
        users: Arc<InMemoryUserDirectory>,
    }

    impl Fixture {
        fn new() -> Self {
            let sessions = Arc::new(InMemorySessionRepository::new());
            let tickets = Arc::new(InMemoryTicketRepository::new(&sessions));
            Self {
                sessions,
                tickets,
                catalog: Arc::new(InMemoryCategoryCatalog::with_default_tree()),
                users: Arc::new(InMemoryUserDirectory::new(vec![User::new(
                    UserId::new("u-1").unwrap(),
                    "alice@example.com",
                )])),
            }
        }

        fn finalizer(&self) -> TicketFinalizer {
            TicketFinalizer::new(self.tickets.clone(), self.catalog.clone(), self.users.clone())
        }

        async fn pending_session(&self) -> AnalysisSession {
            let session = AnalysisSession::new(
                SessionId::new(),
                "mot de passe oublié",
                TriageAction::ConfirmSummary,
                Timestamp::now(),
                30,
            )
            .unwrap()
            .with_summary(Some(summary()), 0.85)
            .with_user_email(Some("Alice@Example.com".to_string()));
            self.sessions.save(&session).await.unwrap();
            session
        }
    }

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            category: Some(CategorySummary {
                id: CategoryId::new(10),
                name: Some("Mot de passe".to_string()),
                confidence: 0.85,
            }),
            priority: Some(Priority::High),
            title: Some("Mot de passe oublié".to_string()),
            symptoms: vec!["Connexion impossible".to_string()],
            original_message: "mot de passe oublié".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn finalize_numbers_and_converts_session() {
        let fx = Fixture::new();
        let session = fx.pending_session().await;
        let now = Timestamp::now();

        let response = fx
            .finalizer()
            .finalize(&session, &summary(), ValidationMethod::ConfirmSummaryConfirm, now)
            .await
            .unwrap();

        assert_eq!(response.ticket_number, format!("TKT-{}-00001", now.year()));
        assert_eq!(response.priority, Priority::High);
        assert_eq!(response.category_name.as_deref(), Some("Mot de passe"));
        assert!(response.ready_for_l1);
        assert!(!response.synced_to_external);
        assert!(response.message.contains("TKT-"));

        let stored = fx.sessions.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), SessionStatus::Converted);
        assert_eq!(stored.ticket_id(), Some(&response.ticket_id));

        let tickets = fx.tickets.all().await;
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].created_by().map(|u| u.as_str()), Some("u-1"));
        assert_eq!(tickets[0].confidence(), 0.85);
    }

    #[tokio::test]
    async fn second_finalize_of_same_session_is_rejected() {
        let fx = Fixture::new();
        let session = fx.pending_session().await;
        let finalizer = fx.finalizer();
        let now = Timestamp::now();

        finalizer
            .finalize(&session, &summary(), ValidationMethod::AutoValidate, now)
            .await
            .unwrap();
        let err = finalizer
            .finalize(&session, &summary(), ValidationMethod::AutoValidate, now)
            .await
            .unwrap_err();

        assert!(matches!(err, TriageError::SessionAlreadyConverted(_)));
        assert_eq!(fx.tickets.all().await.len(), 1);
    }

    #[tokio::test]
    async fn numbers_increase_within_a_year() {
        let fx = Fixture::new();
        let finalizer = fx.finalizer();
        let now = Timestamp::now();

        let first = finalizer.escalate("aide", 3, None, now).await.unwrap();
        let second = finalizer.escalate("aide encore", 3, None, now).await.unwrap();

        assert_eq!(first.ticket_number, format!("TKT-{}-00001", now.year()));
        assert_eq!(second.ticket_number, format!("TKT-{}-00002", now.year()));
    }

    #[tokio::test]
    async fn dual_mode_keeps_local_ticket_when_external_fails() {
        let fx = Fixture::new();
        let session = fx.pending_session().await;
        let finalizer = fx
            .finalizer()
            .with_external(Arc::new(MockExternal::failing()), SyncMode::Dual);

        let response = finalizer
            .finalize(&session, &summary(), ValidationMethod::AutoValidate, Timestamp::now())
            .await
            .unwrap();

        assert!(!response.synced_to_external);
        assert!(response.external_ticket_id.is_none());
        assert_eq!(fx.tickets.all().await.len(), 1);
    }

    #[tokio::test]
    async fn external_only_mode_aborts_before_local_write() {
        let fx = Fixture::new();
        let session = fx.pending_session().await;
        let finalizer = fx
            .finalizer()
            .with_external(Arc::new(MockExternal::failing()), SyncMode::GlpiOnly);

        let err = finalizer
            .finalize(&session, &summary(), ValidationMethod::AutoValidate, Timestamp::now())
            .await
            .unwrap_err();

        assert!(matches!(err, TriageError::ExternalSyncFailed(_)));
        assert!(fx.tickets.all().await.is_empty());
        let stored = fx.sessions.find_by_id(session.id()).await.unwrap().unwrap();
        assert!(stored.is_pending());
    }

    #[tokio::test]
    async fn synced_ticket_records_external_id_and_note() {
        let fx = Fixture::new();
        let session = fx.pending_session().await;
        let external = Arc::new(MockExternal::new());
        let finalizer = fx.finalizer().with_external(external.clone(), SyncMode::Dual);

        let response = finalizer
            .finalize(&session, &summary(), ValidationMethod::AutoValidate, Timestamp::now())
            .await
            .unwrap();

        assert_eq!(response.external_ticket_id, Some(1001));
        assert!(response.synced_to_external);
        assert!(response.message.contains("GLPI ID: 1001"));

        let created = external.created.lock().unwrap().clone();
        assert!(created[0].description.contains("Message original:\nmot de passe oublié"));
        assert_eq!(created[0].requester_email.as_deref(), Some("Alice@Example.com"));

        let notes = external.notes.lock().unwrap().clone();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].2);
        assert!(notes[0].1.contains("Confiance: 85%"));
    }

    #[tokio::test]
    async fn escalation_creates_bucket_and_flags_human() {
        let fx = Fixture::new();
        let finalizer = fx.finalizer();

        let response = finalizer
            .escalate("ça marche pas", 3, None, Timestamp::now())
            .await
            .unwrap();

        assert_eq!(response.escalated_to_human, Some(true));
        assert_eq!(response.priority, Priority::High);
        assert!(!response.ready_for_l1);
        assert_eq!(response.category_name.as_deref(), Some(UNCATEGORIZED_NAME));
        assert!(response.title.starts_with("Demande nécessitant clarification"));

        let bucket = fx.catalog.ensure_uncategorized().await.unwrap();
        assert_eq!(bucket.abbreviation.as_deref(), Some(UNCATEGORIZED_ABBREVIATION));

        let ticket = &fx.tickets.all().await[0];
        assert_eq!(ticket.confidence(), 0.0);
        assert!(ticket.symptoms().is_empty());
        assert_eq!(ticket.validation_method(), ValidationMethod::MaxAttemptsEscalation);
        assert_eq!(ticket.category_id(), Some(bucket.id));
    }

    #[tokio::test]
    async fn escalation_survives_external_failure_in_external_only_mode() {
        let fx = Fixture::new();
        let finalizer = fx
            .finalizer()
            .with_external(Arc::new(MockExternal::failing()), SyncMode::GlpiOnly);

        let response = finalizer
            .escalate("toujours bloqué", 3, None, Timestamp::now())
            .await
            .unwrap();

        assert_eq!(response.escalated_to_human, Some(true));
        assert!(!response.synced_to_external);
    }

    #[test]
    fn sync_mode_accepts_both_spellings() {
        let mode: SyncMode = serde_json::from_str("\"glpi_only\"").unwrap();
        assert_eq!(mode, SyncMode::GlpiOnly);
        let mode: SyncMode = serde_json::from_str("\"external_only\"").unwrap();
        assert_eq!(mode, SyncMode::GlpiOnly);
        assert_eq!(SyncMode::default().as_str(), "dual");
    }
}
