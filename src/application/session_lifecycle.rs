//! Session lifecycle: creation, guarded loading, invalidation.
//!
//! Expiry is enforced lazily here; there is no background sweeper.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::foundation::{SessionId, SessionStatus, Timestamp};
use crate::domain::triage::{AnalysisSession, TriageError};
use crate::ports::SessionRepository;

/// Loads and stores analysis sessions on behalf of the handlers.
pub struct SessionLifecycle {
    sessions: Arc<dyn SessionRepository>,
    ttl_minutes: i64,
}

impl SessionLifecycle {
    pub fn new(sessions: Arc<dyn SessionRepository>, ttl_minutes: i64) -> Self {
        Self {
            sessions,
            ttl_minutes,
        }
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }

    /// Persists a freshly built session.
    pub async fn create(&self, session: &AnalysisSession) -> Result<(), TriageError> {
        self.sessions.save(session).await?;
        debug!(
            session_id = %session.id(),
            action = %session.action(),
            attempts = session.attempts(),
            "Analysis session created"
        );
        Ok(())
    }

    /// Loads a session that can still be acted upon.
    ///
    /// Expiry wins over every status: a session past its expiry is not found
    /// even if it was converted. Only a pending one is marked expired.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if absent, expired or invalidated
    /// - `SessionAlreadyConverted` if a ticket was already created from it
    pub async fn load(&self, id: &SessionId, now: Timestamp) -> Result<AnalysisSession, TriageError> {
        let mut session = self
            .sessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| TriageError::not_found(*id))?;

        if session.is_expired_at(&now) {
            info!(session_id = %id, status = %session.status(), "Session expired");
            if session.is_pending() {
                session.expire()?;
                if let Err(err) = self.sessions.update(&session).await {
                    warn!(session_id = %id, error = %err, "Failed to persist session expiry");
                }
            }
            return Err(TriageError::not_found(*id));
        }

        if session.status() == SessionStatus::Converted {
            info!(session_id = %id, "Replay on converted session rejected");
            return Err(TriageError::SessionAlreadyConverted(*id));
        }

        if !session.is_pending() {
            debug!(session_id = %id, status = %session.status(), "Session no longer usable");
            return Err(TriageError::not_found(*id));
        }

        Ok(session)
    }

    /// Marks a session as superseded.
    pub async fn invalidate(
        &self,
        session: &mut AnalysisSession,
        reason: &str,
    ) -> Result<(), TriageError> {
        session.invalidate(reason)?;
        self.sessions.update(session).await?;
        debug!(session_id = %session.id(), reason = reason, "Session invalidated");
        Ok(())
    }

    /// Invalidates a session by id, logging instead of failing.
    ///
    /// Used once the successor session is safely stored: by then the turn
    /// has succeeded and a stale parent only lingers until expiry.
    pub async fn supersede(&self, id: &SessionId, reason: &str) {
        let result = match self.sessions.find_by_id(id).await {
            Ok(Some(mut session)) if session.is_pending() => {
                self.invalidate(&mut session, reason).await
            }
            Ok(_) => Ok(()),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!(session_id = %id, error = %err, "Failed to invalidate superseded session");
        }
    }
}
