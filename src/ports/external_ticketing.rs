//! External ticket-of-record port.
//!
//! The helpdesk system of record receives a copy of every ticket when
//! sync is enabled.

use async_trait::async_trait;

use crate::domain::foundation::{CategoryId, Priority};

#[async_trait]
pub trait ExternalTicketing: Send + Sync {
    /// Create the external copy and return its id.
    ///
    /// Linking the requester is best-effort and never fails the call.
    async fn create_ticket(&self, ticket: &ExternalTicket) -> Result<i64, ExternalTicketingError>;

    /// Attach a follow-up note.
    async fn add_note(
        &self,
        external_id: i64,
        text: &str,
        private: bool,
    ) -> Result<(), ExternalTicketingError>;
}

/// Fields sent to the external system.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTicket {
    pub title: String,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub priority: Priority,
    pub requester_email: Option<String>,
}

/// External ticketing errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExternalTicketingError {
    /// Session could not be opened or renewed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Server answered with a non-success status.
    #[error("external system returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ExternalTicketingError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// True when the stored session token is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ExternalTicketingError::Http { status: 401, .. })
    }
}
