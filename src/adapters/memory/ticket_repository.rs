//! In-memory ticket repository sharing the session store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::session_repository::{InMemorySessionRepository, SessionStore};
use crate::domain::foundation::{DomainError, ErrorCode, SessionId, TicketId, Timestamp};
use crate::domain::ticket::{Ticket, TicketNumber};
use crate::ports::TicketRepository;

#[derive(Debug, Clone)]
pub struct InMemoryTicketRepository {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
    sessions: SessionStore,
}

impl InMemoryTicketRepository {
    /// Creates a repository converting sessions held by `sessions`.
    pub fn new(sessions: &InMemorySessionRepository) -> Self {
        Self {
            tickets: Arc::new(RwLock::new(HashMap::new())),
            sessions: sessions.store(),
        }
    }

    /// All stored tickets, oldest first.
    pub async fn all(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.tickets.read().await.values().cloned().collect();
        tickets.sort_by_key(|t| (t.number().year(), t.number().sequence()));
        tickets
    }
}

fn ensure_unique_number(
    tickets: &HashMap<TicketId, Ticket>,
    ticket: &Ticket,
) -> Result<(), DomainError> {
    if tickets.values().any(|t| t.number() == ticket.number()) {
        return Err(DomainError::new(
            ErrorCode::DuplicateTicketNumber,
            format!("Ticket number already taken: {}", ticket.number()),
        ));
    }
    Ok(())
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), DomainError> {
        let mut tickets = self.tickets.write().await;
        ensure_unique_number(&tickets, ticket)?;
        tickets.insert(*ticket.id(), ticket.clone());
        Ok(())
    }

    async fn insert_and_convert(
        &self,
        ticket: &Ticket,
        session_id: &SessionId,
        converted_at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        let mut tickets = self.tickets.write().await;

        let session = sessions.get_mut(session_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session_id),
            )
        })?;
        if !session.is_pending() {
            return Err(DomainError::new(
                ErrorCode::SessionAlreadyConverted,
                format!("Session is no longer pending: {}", session_id),
            )
            .with_detail("session_id", session_id.to_string()));
        }
        ensure_unique_number(&tickets, ticket)?;

        session.convert(*ticket.id(), converted_at)?;
        tickets.insert(*ticket.id(), ticket.clone());
        Ok(())
    }

    async fn max_sequence_for_year(&self, year: i32) -> Result<Option<u32>, DomainError> {
        Ok(self
            .tickets
            .read()
            .await
            .values()
            .filter(|t| t.number().year() == year)
            .map(|t| t.number().sequence())
            .max())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError> {
        Ok(self.tickets.read().await.get(id).cloned())
    }

    async fn find_by_number(&self, number: &TicketNumber) -> Result<Option<Ticket>, DomainError> {
        Ok(self
            .tickets
            .read()
            .await
            .values()
            .find(|t| t.number() == number)
            .cloned())
    }
}
