//! Triage workflow error types.

use thiserror::Error;

use super::messages;
use crate::domain::foundation::{DomainError, ErrorCode, SessionId};

/// Errors surfaced by the triage workflow.
#[derive(Debug, Clone, Error)]
pub enum TriageError {
    /// Session is absent or past its expiry.
    #[error("session not found or expired: {0:?}")]
    SessionNotFound(Option<SessionId>),

    /// Session already produced a ticket.
    #[error("session already converted: {0}")]
    SessionAlreadyConverted(SessionId),

    /// Reply could not be read as the expected confirmation or edit.
    #[error("invalid user response: {0}")]
    InvalidUserResponse(String),

    /// Classifier failed after retries, or returned malformed output.
    #[error("classification failed: {0}")]
    ClassificationFailure(String),

    /// No leaf category to classify against.
    #[error("no active leaf category available")]
    CategoryUnavailable,

    /// External ticket-of-record refused the ticket in external-only mode.
    #[error("external ticketing failed: {0}")]
    ExternalSyncFailed(String),

    #[error("validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl TriageError {
    pub fn not_found(id: SessionId) -> Self {
        TriageError::SessionNotFound(Some(id))
    }

    pub fn invalid_response() -> Self {
        TriageError::InvalidUserResponse(messages::ERROR_INVALID_RESPONSE.to_string())
    }

    pub fn invalid_modification() -> Self {
        TriageError::InvalidUserResponse(messages::ERROR_INVALID_MODIFICATION.to_string())
    }

    pub fn classification(message: impl Into<String>) -> Self {
        TriageError::ClassificationFailure(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        TriageError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        TriageError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TriageError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            TriageError::SessionAlreadyConverted(_) => ErrorCode::SessionAlreadyConverted,
            TriageError::InvalidUserResponse(_) => ErrorCode::InvalidUserResponse,
            TriageError::ClassificationFailure(_) => ErrorCode::ClassificationFailure,
            TriageError::CategoryUnavailable => ErrorCode::CategoryUnavailable,
            TriageError::ExternalSyncFailed(_) => ErrorCode::ExternalSyncFailed,
            TriageError::Validation { .. } => ErrorCode::ValidationFailed,
            TriageError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Text shown to the end user.
    pub fn message(&self) -> String {
        match self {
            TriageError::SessionNotFound(_) => messages::ERROR_SESSION_NOT_FOUND.to_string(),
            TriageError::SessionAlreadyConverted(_) => {
                messages::ERROR_SESSION_ALREADY_USED.to_string()
            }
            TriageError::InvalidUserResponse(msg) => msg.clone(),
            TriageError::ClassificationFailure(_) => messages::ERROR_AI_ANALYSIS.to_string(),
            TriageError::CategoryUnavailable => messages::ERROR_NO_CATEGORIES.to_string(),
            TriageError::ExternalSyncFailed(_) => messages::ERROR_EXTERNAL_SYNC.to_string(),
            TriageError::Validation { message, .. } => format!("⚠️ {}", message),
            TriageError::Infrastructure(_) => messages::ERROR_INTERNAL.to_string(),
        }
    }

    /// True if the same request may succeed when sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TriageError::ClassificationFailure(_)
                | TriageError::ExternalSyncFailed(_)
                | TriageError::Infrastructure(_)
        )
    }
}

impl From<DomainError> for TriageError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::SessionNotFound => TriageError::SessionNotFound(None),
            ErrorCode::SessionAlreadyConverted => err
                .details
                .get("session_id")
                .and_then(|id| id.parse().ok())
                .map(TriageError::SessionAlreadyConverted)
                .unwrap_or_else(|| TriageError::InvalidUserResponse(err.message.clone())),
            ErrorCode::InvalidUserResponse => TriageError::InvalidUserResponse(err.message),
            ErrorCode::CategoryUnavailable => TriageError::CategoryUnavailable,
            ErrorCode::ClassificationFailure => TriageError::ClassificationFailure(err.message),
            ErrorCode::ExternalSyncFailed => TriageError::ExternalSyncFailed(err.message),
            ErrorCode::ValidationFailed => TriageError::Validation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => TriageError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_error_kinds() {
        let id = SessionId::new();
        assert_eq!(TriageError::not_found(id).code(), ErrorCode::SessionNotFound);
        assert_eq!(
            TriageError::SessionAlreadyConverted(id).code(),
            ErrorCode::SessionAlreadyConverted
        );
        assert_eq!(TriageError::invalid_response().code(), ErrorCode::InvalidUserResponse);
        assert_eq!(TriageError::CategoryUnavailable.code(), ErrorCode::CategoryUnavailable);
    }

    #[test]
    fn user_messages_are_french() {
        assert_eq!(
            TriageError::SessionNotFound(None).message(),
            "⚠️ Session expirée ou invalide. Veuillez recommencer."
        );
        assert!(TriageError::invalid_modification().message().contains("titre"));
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(TriageError::classification("timeout").is_retryable());
        assert!(!TriageError::invalid_response().is_retryable());
        assert!(!TriageError::CategoryUnavailable.is_retryable());
    }

    #[test]
    fn converted_domain_error_keeps_session_id() {
        let id = SessionId::new();
        let err = DomainError::new(ErrorCode::SessionAlreadyConverted, "already converted")
            .with_detail("session_id", id.to_string());
        match TriageError::from(err) {
            TriageError::SessionAlreadyConverted(got) => assert_eq!(got, id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn database_errors_become_infrastructure() {
        let err = DomainError::database("insert ticket", "connection reset");
        assert!(matches!(TriageError::from(err), TriageError::Infrastructure(_)));
    }
}
