//! PostgreSQL implementation of TicketRepository.
//!
//! Ticket creation and session conversion share one transaction; the
//! conversion is a compare-and-set on `status = 'pending'`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::column;
use super::session_repository::to_naive;
use crate::domain::foundation::{
    CategoryId, DomainError, ErrorCode, Priority, SessionId, TicketId, Timestamp, UserId,
};
use crate::domain::ticket::{
    ExternalLink, Ticket, TicketNumber, TicketStatus, ValidationMethod,
};
use crate::ports::TicketRepository;

const UNIQUE_VIOLATION: &str = "23505";

const TICKET_COLUMNS: &str = "id, ticket_number, title, description, original_message, status, \
     priority, category_id, created_by, confidence, symptoms, validation_method, ready_for_l1, \
     external_id, external_synced_at, created_at";

/// PostgreSQL implementation of TicketRepository.
#[derive(Clone)]
pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    /// Creates a new PostgresTicketRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        ticket: &Ticket,
    ) -> Result<(), DomainError> {
        let symptoms = serde_json::to_value(ticket.symptoms()).map_err(|e| {
            DomainError::new(ErrorCode::InternalError, format!("Failed to encode symptoms: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, ticket_number, ticket_year, ticket_sequence, title, description,
                original_message, status, priority, category_id, created_by, confidence,
                symptoms, validation_method, ready_for_l1, external_id, external_synced_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(ticket.id().as_uuid())
        .bind(ticket.number().to_string())
        .bind(ticket.number().year())
        .bind(ticket.number().sequence() as i32)
        .bind(ticket.title())
        .bind(ticket.description())
        .bind(ticket.original_message())
        .bind(ticket.status().as_str())
        .bind(ticket.priority().as_str())
        .bind(ticket.category_id().map(|id| id.value()))
        .bind(ticket.created_by().map(|id| id.as_str().to_string()))
        .bind(ticket.confidence())
        .bind(symptoms)
        .bind(ticket.validation_method().as_str())
        .bind(ticket.ready_for_l1())
        .bind(ticket.external_id())
        .bind(ticket.external_synced_at().map(|t| *t.as_datetime()))
        .bind(ticket.created_at().as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_insert_error(ticket, e))?;

        Ok(())
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        Self::insert_in(&mut tx, ticket).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit ticket", e))
    }

    async fn insert_and_convert(
        &self,
        ticket: &Ticket,
        session_id: &SessionId,
        converted_at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let converted = sqlx::query(
            r#"
            UPDATE analysis_sessions SET
                status = 'converted_to_ticket',
                ticket_id = $2,
                converted_at = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(ticket.id().as_uuid())
        .bind(to_naive(&converted_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to convert session", e))?;

        if converted.rows_affected() == 0 {
            let exists: Option<(uuid::Uuid,)> =
                sqlx::query_as("SELECT id FROM analysis_sessions WHERE id = $1")
                    .bind(session_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| DomainError::database("Failed to fetch analysis session", e))?;

            return Err(match exists {
                Some(_) => DomainError::new(
                    ErrorCode::SessionAlreadyConverted,
                    format!("Session is no longer pending: {}", session_id),
                )
                .with_detail("session_id", session_id.to_string()),
                None => DomainError::new(
                    ErrorCode::SessionNotFound,
                    format!("Session not found: {}", session_id),
                ),
            });
        }

        Self::insert_in(&mut tx, ticket).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit ticket", e))
    }

    async fn max_sequence_for_year(&self, year: i32) -> Result<Option<u32>, DomainError> {
        let max: (Option<i32>,) =
            sqlx::query_as("SELECT MAX(ticket_sequence) FROM tickets WHERE ticket_year = $1")
                .bind(year)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to read ticket sequence", e))?;

        Ok(max.0.map(|seq| seq.max(0) as u32))
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch ticket", e))?;

        row.map(row_to_ticket).transpose()
    }

    async fn find_by_number(&self, number: &TicketNumber) -> Result<Option<Ticket>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE ticket_number = $1",
            TICKET_COLUMNS
        ))
        .bind(number.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch ticket", e))?;

        row.map(row_to_ticket).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn map_insert_error(ticket: &Ticket, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return DomainError::new(
                ErrorCode::DuplicateTicketNumber,
                format!("Ticket number already taken: {}", ticket.number()),
            );
        }
    }
    DomainError::database("Failed to insert ticket", err)
}

fn parse_column<T>(row: &sqlx::postgres::PgRow, name: &str) -> Result<T, DomainError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e| DomainError::database(&format!("Invalid {}", name), e))
}

fn row_to_ticket(row: sqlx::postgres::PgRow) -> Result<Ticket, DomainError> {
    let id: uuid::Uuid = column(&row, "id")?;
    let number: TicketNumber = parse_column(&row, "ticket_number")?;
    let status: TicketStatus = parse_column(&row, "status")?;
    let priority: Priority = parse_column(&row, "priority")?;
    let validation_method: ValidationMethod = parse_column(&row, "validation_method")?;

    let category_id: Option<i64> = column(&row, "category_id")?;
    let created_by: Option<String> = column(&row, "created_by")?;
    let created_by = created_by
        .map(UserId::new)
        .transpose()
        .map_err(|e| DomainError::database("Invalid created_by", e))?;

    let symptoms_json: serde_json::Value = column(&row, "symptoms")?;
    let symptoms: Vec<String> = serde_json::from_value(symptoms_json)
        .map_err(|e| DomainError::database("Invalid stored symptoms", e))?;

    let external_id: Option<i64> = column(&row, "external_id")?;
    let external_synced_at: Option<chrono::DateTime<chrono::Utc>> =
        column(&row, "external_synced_at")?;
    let external = match (external_id, external_synced_at) {
        (Some(external_id), Some(synced_at)) => Some(ExternalLink {
            external_id,
            synced_at: Timestamp::from_datetime(synced_at),
        }),
        _ => None,
    };

    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;

    Ok(Ticket::reconstitute(
        TicketId::from_uuid(id),
        number,
        column(&row, "title")?,
        column(&row, "description")?,
        column(&row, "original_message")?,
        status,
        priority,
        category_id.map(CategoryId::new),
        created_by,
        column(&row, "confidence")?,
        symptoms,
        validation_method,
        column(&row, "ready_for_l1")?,
        external,
        Timestamp::from_datetime(created_at),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_map_to_database_error() {
        let ticket = Ticket::reconstitute(
            TicketId::new(),
            TicketNumber::new(2025, 1).unwrap(),
            "t".to_string(),
            "d".to_string(),
            "m".to_string(),
            TicketStatus::Open,
            Priority::Low,
            None,
            None,
            0.5,
            vec![],
            ValidationMethod::AutoValidate,
            true,
            None,
            Timestamp::now(),
        );
        let err = map_insert_error(&ticket, sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
