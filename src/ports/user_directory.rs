//! User directory port.

use async_trait::async_trait;

use crate::domain::catalog::User;
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Case-insensitive email lookup.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
}
