//! Category catalog port.
//!
//! Read-only view of the category tree, plus lazy creation of the bucket
//! escalated tickets land in.

use async_trait::async_trait;

use crate::domain::catalog::Category;
use crate::domain::foundation::{CategoryId, DomainError};

#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    /// Every active node of both levels.
    async fn list_active_categories(&self) -> Result<Vec<Category>, DomainError>;

    /// Find a category by id, active or not.
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, DomainError>;

    /// Looks up the uncategorized bucket, creating it when missing.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn ensure_uncategorized(&self) -> Result<Category, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_catalog_is_object_safe() {
        fn _accepts_dyn(_catalog: &dyn CategoryCatalog) {}
    }
}
