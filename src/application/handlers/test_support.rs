//! Shared fixtures for handler tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use super::{
    AnalyzeTurnHandler, AutoValidateHandler, ClarificationHandler, ConfirmSummaryHandler,
    TopicShiftChoiceHandler,
};
use crate::adapters::memory::{
    InMemoryCategoryCatalog, InMemorySessionRepository, InMemoryTicketRepository,
    InMemoryUserDirectory,
};
use crate::application::session_lifecycle::SessionLifecycle;
use crate::application::ticket_finalizer::TicketFinalizer;
use crate::domain::foundation::{CategoryId, Priority, SessionId, Timestamp};
use crate::domain::triage::{
    AnalysisSession, AnalysisSummary, CategorySummary, SeedSource, TriageAction,
    MAX_CLARIFICATION_ATTEMPTS,
};
use crate::ports::{
    AnalysisRecord, ClassificationRequest, Classifier, ClassifierError, SessionRepository,
};

/// Classifier answering from a script, recording every request.
#[derive(Default)]
pub struct ScriptedClassifier {
    answers: Mutex<VecDeque<Result<AnalysisRecord, ClassifierError>>>,
    requests: Mutex<Vec<ClassificationRequest>>,
}

impl ScriptedClassifier {
    pub fn push(&self, answer: Result<AnalysisRecord, ClassifierError>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ClassificationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AnalysisRecord, ClassifierError> {
        self.requests.lock().unwrap().push(request.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClassifierError::decode("no scripted answer")))
    }
}

pub fn record(category: Option<i64>, confidence: f64) -> AnalysisRecord {
    AnalysisRecord {
        category_id: category.map(CategoryId::new),
        confidence,
        title: "Problème signalé".to_string(),
        symptoms: vec!["Symptôme principal".to_string()],
        priority: Priority::Medium,
        extracted_info: BTreeMap::new(),
        missing_info: vec![],
        clarification_question: None,
    }
}

pub fn summary() -> AnalysisSummary {
    AnalysisSummary {
        category: Some(CategorySummary {
            id: CategoryId::new(10),
            name: Some("Mot-de-passe".to_string()),
            confidence: 0.99,
        }),
        priority: Some(Priority::High),
        title: Some("Mot de passe oublié".to_string()),
        symptoms: vec!["Connexion refusée".to_string()],
        original_message: "mot de passe oublié".to_string(),
        ..Default::default()
    }
}

/// In-memory wiring of every handler.
pub struct Harness {
    pub classifier: Arc<ScriptedClassifier>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub tickets: Arc<InMemoryTicketRepository>,
    pub lifecycle: Arc<SessionLifecycle>,
    pub finalizer: Arc<TicketFinalizer>,
    catalog: Arc<InMemoryCategoryCatalog>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_catalog(InMemoryCategoryCatalog::with_default_tree())
    }

    pub fn with_empty_catalog() -> Self {
        Self::with_catalog(InMemoryCategoryCatalog::empty())
    }

    fn with_catalog(catalog: InMemoryCategoryCatalog) -> Self {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let tickets = Arc::new(InMemoryTicketRepository::new(&sessions));
        let catalog = Arc::new(catalog);
        let lifecycle = Arc::new(SessionLifecycle::new(sessions.clone(), 30));
        let finalizer = Arc::new(TicketFinalizer::new(
            tickets.clone(),
            catalog.clone(),
            Arc::new(InMemoryUserDirectory::default()),
        ));
        Self {
            classifier: Arc::new(ScriptedClassifier::default()),
            sessions,
            tickets,
            lifecycle,
            finalizer,
            catalog,
        }
    }

    pub fn analyze(&self) -> AnalyzeTurnHandler {
        AnalyzeTurnHandler::new(
            self.classifier.clone(),
            self.catalog.clone(),
            self.lifecycle.clone(),
            self.finalizer.clone(),
            MAX_CLARIFICATION_ATTEMPTS,
            SeedSource::Fixed(7),
        )
    }

    pub fn auto_validate(&self) -> AutoValidateHandler {
        AutoValidateHandler::new(self.lifecycle.clone(), self.finalizer.clone())
    }

    pub fn confirm(&self) -> ConfirmSummaryHandler {
        ConfirmSummaryHandler::new(self.lifecycle.clone(), self.finalizer.clone())
    }

    pub fn clarification(&self) -> ClarificationHandler {
        ClarificationHandler::new(
            self.lifecycle.clone(),
            Arc::new(self.analyze()),
            SeedSource::Fixed(7),
        )
    }

    pub fn topic_shift(&self) -> TopicShiftChoiceHandler {
        TopicShiftChoiceHandler::new(self.lifecycle.clone(), Arc::new(self.analyze()))
    }

    /// Stores a pending session with the sample summary.
    pub async fn pending_session(
        &self,
        message: &str,
        action: TriageAction,
        attempts: u32,
    ) -> AnalysisSession {
        let summary = (action != TriageAction::TooVague).then(summary);
        let session = AnalysisSession::new(SessionId::new(), message, action, Timestamp::now(), 30)
            .unwrap()
            .with_summary(summary, 0.99)
            .with_parent(None, attempts);
        self.sessions.save(&session).await.unwrap();
        session
    }

    pub async fn save(&self, session: &AnalysisSession) {
        self.sessions.save(session).await.unwrap();
    }

    pub async fn session(&self, id: SessionId) -> AnalysisSession {
        self.sessions.find_by_id(&id).await.unwrap().unwrap()
    }
}
