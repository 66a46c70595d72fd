//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSessionRepository` - Analysis sessions, summary as JSONB
//! - `PostgresTicketRepository` - Tickets, with atomic session conversion
//! - `PostgresCategoryCatalog` - Category tree and the uncategorized bucket
//! - `PostgresUserDirectory` - Email lookups
//!
//! Schema lives in `migrations/` and is applied with [`run_migrations`].

mod category_catalog;
mod session_repository;
mod ticket_repository;
mod user_directory;

pub use category_catalog::PostgresCategoryCatalog;
pub use session_repository::PostgresSessionRepository;
pub use ticket_repository::PostgresTicketRepository;
pub use user_directory::PostgresUserDirectory;

use sqlx::{PgPool, Row};

use crate::domain::foundation::DomainError;

/// Applies the embedded migrations.
///
/// # Errors
///
/// - `DatabaseError` if a migration fails
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database("Failed to run migrations", e))
}

fn column<'r, T>(row: &'r sqlx::postgres::PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(&format!("Failed to get {}", name), e))
}
