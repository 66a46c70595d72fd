//! In-memory session repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::triage::AnalysisSession;
use crate::ports::SessionRepository;

pub(super) type SessionStore = Arc<RwLock<HashMap<SessionId, AnalysisSession>>>;

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: SessionStore,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn store(&self) -> SessionStore {
        Arc::clone(&self.sessions)
    }

    /// Number of stored sessions, whatever their status.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &AnalysisSession) -> Result<(), DomainError> {
        self.sessions
            .write()
            .await
            .insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &AnalysisSession) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session.id()) {
            Some(stored) if stored.is_pending() => {
                *stored = session.clone();
                Ok(())
            }
            Some(stored) => Err(DomainError::session_not_pending(session.id(), stored.status())),
            None => Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<AnalysisSession>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionStatus, Timestamp};
    use crate::domain::triage::{TriageAction, DEFAULT_SESSION_TTL_MINUTES};

    fn session() -> AnalysisSession {
        AnalysisSession::new(
            SessionId::new(),
            "mon imprimante ne marche plus",
            TriageAction::AskClarification,
            Timestamp::now(),
            DEFAULT_SESSION_TTL_MINUTES,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_find() {
        let repo = InMemorySessionRepository::new();
        let session = session();
        repo.save(&session).await.unwrap();

        let found = repo.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(found.original_message(), "mon imprimante ne marche plus");
        assert!(repo.find_by_id(&SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_persists_transitions() {
        let repo = InMemorySessionRepository::new();
        let mut session = session();
        repo.save(&session).await.unwrap();

        session.invalidate("superseded").unwrap();
        repo.update(&session).await.unwrap();

        let found = repo.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(found.status(), SessionStatus::Invalidated);
    }

    #[tokio::test]
    async fn update_of_unknown_session_fails() {
        let repo = InMemorySessionRepository::new();
        let err = repo.update(&session()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn stale_copy_cannot_revive_invalidated_session() {
        let repo = InMemorySessionRepository::new();
        let mut session = session();
        repo.save(&session).await.unwrap();
        let mut stale = session.clone();

        session.invalidate("topic_replaced").unwrap();
        repo.update(&session).await.unwrap();

        stale.expire().unwrap();
        let err = repo.update(&stale).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);

        let stored = repo.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), SessionStatus::Invalidated);
    }
}
