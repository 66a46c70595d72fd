//! Analysis session repository port.
//!
//! Sessions are never deleted; terminal states are written with `update`.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::triage::AnalysisSession;

/// Repository port for AnalysisSession persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &AnalysisSession) -> Result<(), DomainError>;

    /// Update an existing session.
    ///
    /// Only a session still stored as pending is written; a stale copy never
    /// overwrites a terminal state.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if session doesn't exist
    /// - `SessionAlreadyConverted` if the stored session was converted
    /// - `InvalidStateTransition` if the stored session is otherwise terminal
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &AnalysisSession) -> Result<(), DomainError>;

    /// Find a session by its ID, whatever its status or expiry.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<AnalysisSession>, DomainError>;
}
