//! PostgreSQL implementation of UserDirectory.

use async_trait::async_trait;
use sqlx::PgPool;

use super::column;
use crate::domain::catalog::User;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserDirectory;

#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            "SELECT id, email, full_name FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch user", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = column(&row, "id")?;
        let id = UserId::new(id).map_err(|e| DomainError::database("Invalid user id", e))?;
        let email: String = column(&row, "email")?;
        let full_name: Option<String> = column(&row, "full_name")?;

        let user = User::new(id, email);
        Ok(Some(match full_name {
            Some(name) => user.with_full_name(name),
            None => user,
        }))
    }
}
