//! In-memory category catalog.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::catalog::{
    default_tree, Category, UNCATEGORIZED_ABBREVIATION, UNCATEGORIZED_NAME,
};
use crate::domain::foundation::{CategoryId, DomainError};
use crate::ports::CategoryCatalog;

#[derive(Debug, Clone)]
pub struct InMemoryCategoryCatalog {
    categories: Arc<RwLock<Vec<Category>>>,
}

impl InMemoryCategoryCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories: Arc::new(RwLock::new(categories)),
        }
    }

    /// Catalog seeded with the nine-domain default tree.
    pub fn with_default_tree() -> Self {
        Self::new(default_tree())
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Default for InMemoryCategoryCatalog {
    fn default() -> Self {
        Self::with_default_tree()
    }
}

#[async_trait]
impl CategoryCatalog for InMemoryCategoryCatalog {
    async fn list_active_categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, DomainError> {
        Ok(self
            .categories
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn ensure_uncategorized(&self) -> Result<Category, DomainError> {
        let mut categories = self.categories.write().await;
        if let Some(existing) = categories.iter().find(|c| c.is_uncategorized()) {
            return Ok(existing.clone());
        }

        let next_id = categories.iter().map(|c| c.id.value()).max().unwrap_or(0) + 1;
        let bucket = Category::domain(CategoryId::new(next_id), UNCATEGORIZED_NAME)
            .with_abbreviation(UNCATEGORIZED_ABBREVIATION)
            .with_description("Demandes escaladées sans catégorie identifiée");
        categories.push(bucket.clone());
        Ok(bucket)
    }
}
