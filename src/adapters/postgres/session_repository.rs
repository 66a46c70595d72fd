//! PostgreSQL implementation of SessionRepository.
//!
//! Persists AnalysisSession aggregates with the summary stored as JSONB.
//! Instants are written as timezone-naive UTC and normalised on read.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;

use super::column;
use crate::domain::foundation::{
    DomainError, ErrorCode, SessionId, SessionStatus, TicketId, Timestamp,
};
use crate::domain::triage::{AnalysisSession, AnalysisSummary, TriageAction};
use crate::ports::SessionRepository;

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a new PostgresSessionRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(super) const SESSION_COLUMNS: &str = "id, original_message, summary, confidence, status, \
     user_email, action, attempts, parent_session_id, selected_choice_id, pending_reply, \
     invalidation_reason, ticket_id, converted_at, created_at, expires_at";

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn save(&self, session: &AnalysisSession) -> Result<(), DomainError> {
        let summary = summary_to_json(session.summary())?;

        sqlx::query(
            r#"
            INSERT INTO analysis_sessions (
                id, original_message, summary, confidence, status, user_email, action,
                attempts, parent_session_id, selected_choice_id, pending_reply,
                invalidation_reason, ticket_id, converted_at, created_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.original_message())
        .bind(summary)
        .bind(session.confidence())
        .bind(session.status().as_str())
        .bind(session.user_email())
        .bind(session.action().as_str())
        .bind(session.attempts() as i32)
        .bind(session.parent_session_id().map(|id| *id.as_uuid()))
        .bind(session.selected_choice_id())
        .bind(session.pending_reply())
        .bind(session.invalidation_reason())
        .bind(session.ticket_id().map(|id| *id.as_uuid()))
        .bind(session.converted_at().map(to_naive))
        .bind(to_naive(session.created_at()))
        .bind(to_naive(session.expires_at()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert analysis session", e))?;

        Ok(())
    }

    async fn update(&self, session: &AnalysisSession) -> Result<(), DomainError> {
        let summary = summary_to_json(session.summary())?;

        let result = sqlx::query(
            r#"
            UPDATE analysis_sessions SET
                summary = $2,
                confidence = $3,
                status = $4,
                selected_choice_id = $5,
                pending_reply = $6,
                invalidation_reason = $7,
                ticket_id = $8,
                converted_at = $9
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(summary)
        .bind(session.confidence())
        .bind(session.status().as_str())
        .bind(session.selected_choice_id())
        .bind(session.pending_reply())
        .bind(session.invalidation_reason())
        .bind(session.ticket_id().map(|id| *id.as_uuid()))
        .bind(session.converted_at().map(to_naive))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update analysis session", e))?;

        if result.rows_affected() == 0 {
            let stored: Option<(String,)> =
                sqlx::query_as("SELECT status FROM analysis_sessions WHERE id = $1")
                    .bind(session.id().as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| DomainError::database("Failed to fetch analysis session", e))?;

            return Err(match stored {
                Some((status,)) => {
                    let status = status.parse::<SessionStatus>().map_err(|e| {
                        DomainError::new(ErrorCode::InternalError, format!("Bad session status: {}", e))
                    })?;
                    DomainError::session_not_pending(session.id(), status)
                }
                None => DomainError::new(
                    ErrorCode::SessionNotFound,
                    format!("Session not found: {}", session.id()),
                ),
            });
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<AnalysisSession>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM analysis_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch analysis session", e))?;

        row.map(row_to_session).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

pub(super) fn to_naive(timestamp: &Timestamp) -> NaiveDateTime {
    timestamp.as_datetime().naive_utc()
}

fn summary_to_json(
    summary: Option<&AnalysisSummary>,
) -> Result<Option<serde_json::Value>, DomainError> {
    summary
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DomainError::new(ErrorCode::InternalError, format!("Failed to encode summary: {}", e)))
}

fn row_to_session(row: sqlx::postgres::PgRow) -> Result<AnalysisSession, DomainError> {
    let id: uuid::Uuid = column(&row, "id")?;
    let original_message: String = column(&row, "original_message")?;

    let summary_json: Option<serde_json::Value> = column(&row, "summary")?;
    let summary = summary_json
        .map(serde_json::from_value::<AnalysisSummary>)
        .transpose()
        .map_err(|e| DomainError::database("Invalid stored summary", e))?;

    let confidence: Option<f64> = column(&row, "confidence")?;

    let status_str: String = column(&row, "status")?;
    let status: SessionStatus = status_str
        .parse()
        .map_err(|e| DomainError::database("Invalid session status", e))?;

    let user_email: Option<String> = column(&row, "user_email")?;

    let action_str: String = column(&row, "action")?;
    let action: TriageAction = action_str
        .parse()
        .map_err(|e| DomainError::database("Invalid session action", e))?;

    let attempts: i32 = column(&row, "attempts")?;
    let parent_session_id: Option<uuid::Uuid> = column(&row, "parent_session_id")?;
    let selected_choice_id: Option<String> = column(&row, "selected_choice_id")?;
    let pending_reply: Option<String> = column(&row, "pending_reply")?;
    let invalidation_reason: Option<String> = column(&row, "invalidation_reason")?;
    let ticket_id: Option<uuid::Uuid> = column(&row, "ticket_id")?;
    let converted_at: Option<NaiveDateTime> = column(&row, "converted_at")?;
    let created_at: NaiveDateTime = column(&row, "created_at")?;
    let expires_at: NaiveDateTime = column(&row, "expires_at")?;

    Ok(AnalysisSession::reconstitute(
        SessionId::from_uuid(id),
        original_message,
        summary,
        confidence,
        status,
        user_email,
        action,
        attempts.max(0) as u32,
        parent_session_id.map(SessionId::from_uuid),
        selected_choice_id,
        pending_reply,
        invalidation_reason,
        ticket_id.map(TicketId::from_uuid),
        converted_at.map(Timestamp::from_naive_utc),
        Timestamp::from_naive_utc(created_at),
        Timestamp::from_naive_utc(expires_at),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_round_trip_keeps_the_instant() {
        let now = Timestamp::now();
        let restored = Timestamp::from_naive_utc(to_naive(&now));
        assert_eq!(restored.to_rfc3339(), now.to_rfc3339());
    }

    #[test]
    fn absent_summary_encodes_as_null() {
        assert_eq!(summary_to_json(None).unwrap(), None);
        let encoded = summary_to_json(Some(&AnalysisSummary::default())).unwrap().unwrap();
        assert!(encoded.get("symptoms").is_some());
    }

    #[test]
    fn column_list_matches_reconstitution_order() {
        assert!(SESSION_COLUMNS.starts_with("id, original_message"));
        assert!(SESSION_COLUMNS.ends_with("created_at, expires_at"));
    }
}
