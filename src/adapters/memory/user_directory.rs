//! In-memory user directory.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::catalog::User;
use crate::domain::foundation::DomainError;
use crate::ports::UserDirectory;

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub async fn add(&self, user: User) {
        self.users.write().await.push(user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.has_email(email))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn finds_users_case_insensitively() {
        let directory = InMemoryUserDirectory::default();
        directory
            .add(User::new(UserId::new("u-1").unwrap(), "Jane.Doe@example.com"))
            .await;

        let found = directory
            .find_user_by_email("jane.doe@EXAMPLE.com")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id.as_str().to_string()), Some("u-1".to_string()));
        assert!(directory
            .find_user_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
