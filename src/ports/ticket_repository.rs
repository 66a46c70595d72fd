//! Ticket repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SessionId, TicketId, Timestamp};
use crate::domain::ticket::{Ticket, TicketNumber};

/// Repository port for Ticket persistence.
///
/// Implementations must keep `ticket_number` unique.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a ticket that no session is waiting on (escalations).
    ///
    /// # Errors
    ///
    /// - `DuplicateTicketNumber` if the number is already taken
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, ticket: &Ticket) -> Result<(), DomainError>;

    /// Insert a ticket and convert its session in one unit of work.
    ///
    /// The session moves to converted only if it is still pending. When it is
    /// not, nothing is written.
    ///
    /// # Errors
    ///
    /// - `SessionAlreadyConverted` if the session was not pending
    /// - `SessionNotFound` if the session doesn't exist
    /// - `DuplicateTicketNumber` if the number is already taken
    /// - `DatabaseError` on persistence failure
    async fn insert_and_convert(
        &self,
        ticket: &Ticket,
        session_id: &SessionId,
        converted_at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Highest sequence used by tickets numbered in `year`.
    async fn max_sequence_for_year(&self, year: i32) -> Result<Option<u32>, DomainError>;

    /// Find a ticket by its ID.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError>;

    /// Find a ticket by its number.
    async fn find_by_number(&self, number: &TicketNumber) -> Result<Option<Ticket>, DomainError>;
}
