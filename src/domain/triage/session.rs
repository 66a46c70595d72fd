//! AnalysisSession aggregate.
//!
//! One session is one pending triage decision waiting for a user reply.
//! Sessions are never deleted: a terminal status (expired, invalidated,
//! converted) retires them.

use serde::{Deserialize, Serialize};

use super::{AnalysisSummary, TriageAction};
use crate::domain::foundation::{
    DomainError, ErrorCode, SessionId, SessionStatus, TicketId, Timestamp,
};

/// Default lifetime of a session, in minutes.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Chained clarification turns allowed before escalating to a human.
pub const MAX_CLARIFICATION_ATTEMPTS: u32 = 3;

/// AnalysisSession aggregate.
///
/// # Invariants
///
/// - `original_message` is non-empty after trim
/// - only a `Pending` session accepts mutations
/// - a converted session always carries `ticket_id` and `converted_at`
/// - `expires_at` is `created_at` plus the configured TTL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    id: SessionId,

    /// Raw text the analysis ran on (possibly enriched by clarifications).
    original_message: String,

    /// Absent for too-vague turns.
    summary: Option<AnalysisSummary>,

    confidence: Option<f64>,

    status: SessionStatus,

    /// Email of the reporting user, when known.
    user_email: Option<String>,

    action: TriageAction,

    /// Clarification turns chained before this one.
    attempts: u32,

    parent_session_id: Option<SessionId>,

    /// Guided choice the user picked to reach this turn.
    selected_choice_id: Option<String>,

    /// Reply held while the user resolves a topic shift.
    pending_reply: Option<String>,

    invalidation_reason: Option<String>,

    ticket_id: Option<TicketId>,

    converted_at: Option<Timestamp>,

    created_at: Timestamp,

    expires_at: Timestamp,
}

impl AnalysisSession {
    /// Create a pending session expiring `ttl_minutes` after `created_at`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the message is blank or the TTL is not positive
    pub fn new(
        id: SessionId,
        original_message: impl Into<String>,
        action: TriageAction,
        created_at: Timestamp,
        ttl_minutes: i64,
    ) -> Result<Self, DomainError> {
        let original_message = original_message.into();
        if original_message.trim().is_empty() {
            return Err(DomainError::validation(
                "original_message",
                "Message cannot be empty",
            ));
        }
        if ttl_minutes <= 0 {
            return Err(DomainError::validation(
                "ttl_minutes",
                "Session lifetime must be positive",
            ));
        }

        Ok(Self {
            id,
            original_message,
            summary: None,
            confidence: None,
            status: SessionStatus::Pending,
            user_email: None,
            action,
            attempts: 0,
            parent_session_id: None,
            selected_choice_id: None,
            pending_reply: None,
            invalidation_reason: None,
            ticket_id: None,
            converted_at: None,
            created_at,
            expires_at: created_at.plus_minutes(ttl_minutes),
        })
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        original_message: String,
        summary: Option<AnalysisSummary>,
        confidence: Option<f64>,
        status: SessionStatus,
        user_email: Option<String>,
        action: TriageAction,
        attempts: u32,
        parent_session_id: Option<SessionId>,
        selected_choice_id: Option<String>,
        pending_reply: Option<String>,
        invalidation_reason: Option<String>,
        ticket_id: Option<TicketId>,
        converted_at: Option<Timestamp>,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id,
            original_message,
            summary,
            confidence,
            status,
            user_email,
            action,
            attempts,
            parent_session_id,
            selected_choice_id,
            pending_reply,
            invalidation_reason,
            ticket_id,
            converted_at,
            created_at,
            expires_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach the analysis outcome.
    pub fn with_summary(mut self, summary: Option<AnalysisSummary>, confidence: f64) -> Self {
        self.summary = summary;
        self.confidence = Some(confidence);
        self
    }

    pub fn with_user_email(mut self, email: Option<String>) -> Self {
        self.user_email = email;
        self
    }

    /// Chain this session after `parent` as clarification turn `attempts`.
    pub fn with_parent(mut self, parent: Option<SessionId>, attempts: u32) -> Self {
        self.parent_session_id = parent;
        self.attempts = attempts;
        self
    }

    pub fn with_selected_choice(mut self, choice_id: Option<String>) -> Self {
        self.selected_choice_id = choice_id;
        self
    }

    pub fn with_pending_reply(mut self, reply: impl Into<String>) -> Self {
        self.pending_reply = Some(reply.into());
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the message the analysis ran on.
    pub fn original_message(&self) -> &str {
        &self.original_message
    }

    /// Returns the stored analysis summary.
    pub fn summary(&self) -> Option<&AnalysisSummary> {
        self.summary.as_ref()
    }

    /// Returns the classification confidence.
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Returns the current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the reporting user's email.
    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    /// Returns the action chosen for this turn.
    pub fn action(&self) -> TriageAction {
        self.action
    }

    /// Returns the clarification attempt counter.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the previous turn's session ID.
    pub fn parent_session_id(&self) -> Option<&SessionId> {
        self.parent_session_id.as_ref()
    }

    /// Returns the guided choice that led to this turn.
    pub fn selected_choice_id(&self) -> Option<&str> {
        self.selected_choice_id.as_deref()
    }

    /// Returns the reply awaiting a topic-shift decision.
    pub fn pending_reply(&self) -> Option<&str> {
        self.pending_reply.as_deref()
    }

    /// Returns why the session was invalidated.
    pub fn invalidation_reason(&self) -> Option<&str> {
        self.invalidation_reason.as_deref()
    }

    /// Returns the ticket this session produced.
    pub fn ticket_id(&self) -> Option<&TicketId> {
        self.ticket_id.as_ref()
    }

    /// Returns when the session was converted.
    pub fn converted_at(&self) -> Option<&Timestamp> {
        self.converted_at.as_ref()
    }

    /// Returns when the session was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns when the session expires.
    pub fn expires_at(&self) -> &Timestamp {
        &self.expires_at
    }

    /// True once `now` has reached the expiry instant.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Retire the session, superseded by a child or a topic-shift decision.
    ///
    /// # Errors
    ///
    /// - `SessionAlreadyConverted` if a ticket was already created
    /// - `InvalidStateTransition` if the session is otherwise terminal
    pub fn invalidate(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(SessionStatus::Invalidated)?;
        self.invalidation_reason = Some(reason.into());
        Ok(())
    }

    /// Mark the session as expired.
    ///
    /// # Errors
    ///
    /// - `SessionAlreadyConverted` if a ticket was already created
    /// - `InvalidStateTransition` if the session is otherwise terminal
    pub fn expire(&mut self) -> Result<(), DomainError> {
        self.transition(SessionStatus::Expired)
    }

    /// Link the created ticket and freeze the session.
    ///
    /// # Errors
    ///
    /// - `SessionAlreadyConverted` if a ticket was already created
    /// - `InvalidStateTransition` if the session is otherwise terminal
    pub fn convert(&mut self, ticket_id: TicketId, at: Timestamp) -> Result<(), DomainError> {
        self.transition(SessionStatus::Converted)?;
        self.ticket_id = Some(ticket_id);
        self.converted_at = Some(at);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn transition(&mut self, target: SessionStatus) -> Result<(), DomainError> {
        if self.status == SessionStatus::Converted {
            return Err(DomainError::new(
                ErrorCode::SessionAlreadyConverted,
                "Session already converted to a ticket",
            )
            .with_detail("session_id", self.id.to_string()));
        }
        if !self.status.can_transition_to(&target) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot move session from {} to {}", self.status, target),
            ));
        }
        self.status = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> AnalysisSession {
        AnalysisSession::new(
            SessionId::new(),
            "mon imprimante ne marche plus",
            TriageAction::AskClarification,
            Timestamp::now(),
            DEFAULT_SESSION_TTL_MINUTES,
        )
        .unwrap()
    }

    #[test]
    fn new_session_is_pending_with_ttl() {
        let now = Timestamp::now();
        let session = AnalysisSession::new(
            SessionId::new(),
            "wifi coupé",
            TriageAction::TooVague,
            now,
            30,
        )
        .unwrap();

        assert_eq!(session.status(), SessionStatus::Pending);
        assert_eq!(session.expires_at(), &now.plus_minutes(30));
        assert_eq!(session.attempts(), 0);
        assert!(session.summary().is_none());
    }

    #[test]
    fn blank_message_is_rejected() {
        let result = AnalysisSession::new(
            SessionId::new(),
            "   ",
            TriageAction::TooVague,
            Timestamp::now(),
            30,
        );
        assert_eq!(result.unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn expiry_is_inclusive() {
        let session = pending();
        let expiry = *session.expires_at();
        assert!(!session.is_expired_at(&expiry.minus_minutes(1)));
        assert!(session.is_expired_at(&expiry));
        assert!(session.is_expired_at(&expiry.plus_minutes(1)));
    }

    #[test]
    fn convert_links_ticket() {
        let mut session = pending();
        let ticket = TicketId::new();
        let at = Timestamp::now();
        session.convert(ticket, at).unwrap();

        assert_eq!(session.status(), SessionStatus::Converted);
        assert_eq!(session.ticket_id(), Some(&ticket));
        assert_eq!(session.converted_at(), Some(&at));
    }

    #[test]
    fn converted_session_rejects_every_mutation() {
        let mut session = pending();
        session.convert(TicketId::new(), Timestamp::now()).unwrap();

        let again = session.convert(TicketId::new(), Timestamp::now());
        assert_eq!(again.unwrap_err().code, ErrorCode::SessionAlreadyConverted);
        assert_eq!(
            session.invalidate("late").unwrap_err().code,
            ErrorCode::SessionAlreadyConverted
        );
        assert_eq!(session.expire().unwrap_err().code, ErrorCode::SessionAlreadyConverted);
    }

    #[test]
    fn invalidated_session_cannot_convert() {
        let mut session = pending();
        session.invalidate("superseded").unwrap();

        assert_eq!(session.invalidation_reason(), Some("superseded"));
        let result = session.convert(TicketId::new(), Timestamp::now());
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn builders_chain_clarification_state() {
        let parent = SessionId::new();
        let session = pending()
            .with_parent(Some(parent), 2)
            .with_selected_choice(Some("cat_3".to_string()))
            .with_user_email(Some("alice@example.com".to_string()))
            .with_summary(Some(AnalysisSummary::default()), 0.5);

        assert_eq!(session.parent_session_id(), Some(&parent));
        assert_eq!(session.attempts(), 2);
        assert_eq!(session.selected_choice_id(), Some("cat_3"));
        assert_eq!(session.user_email(), Some("alice@example.com"));
        assert_eq!(session.confidence(), Some(0.5));
    }
}
