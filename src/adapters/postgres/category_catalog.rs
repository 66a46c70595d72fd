//! PostgreSQL implementation of CategoryCatalog.

use async_trait::async_trait;
use sqlx::PgPool;

use super::column;
use crate::domain::catalog::{Category, DOMAIN_LEVEL, UNCATEGORIZED_ABBREVIATION, UNCATEGORIZED_NAME};
use crate::domain::foundation::{CategoryId, DomainError};
use crate::ports::CategoryCatalog;

const CATEGORY_COLUMNS: &str = "id, name, abbreviation, parent_id, level, is_active, description";

#[derive(Clone)]
pub struct PostgresCategoryCatalog {
    pool: PgPool,
}

impl PostgresCategoryCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_uncategorized(&self) -> Result<Option<Category>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE abbreviation = $1 AND level = $2",
            CATEGORY_COLUMNS
        ))
        .bind(UNCATEGORIZED_ABBREVIATION)
        .bind(DOMAIN_LEVEL as i16)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch uncategorized bucket", e))?;

        row.map(row_to_category).transpose()
    }
}

#[async_trait]
impl CategoryCatalog for PostgresCategoryCatalog {
    async fn list_active_categories(&self) -> Result<Vec<Category>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE is_active ORDER BY level, id",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list categories", e))?;

        rows.into_iter().map(row_to_category).collect()
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch category", e))?;

        row.map(row_to_category).transpose()
    }

    async fn ensure_uncategorized(&self) -> Result<Category, DomainError> {
        if let Some(existing) = self.find_uncategorized().await? {
            return Ok(existing);
        }

        // A concurrent creator wins on the partial unique index; re-read then.
        sqlx::query(
            r#"
            INSERT INTO categories (name, abbreviation, parent_id, level, is_active, description)
            VALUES ($1, $2, NULL, $3, TRUE, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(UNCATEGORIZED_NAME)
        .bind(UNCATEGORIZED_ABBREVIATION)
        .bind(DOMAIN_LEVEL as i16)
        .bind("Demandes escaladées sans catégorie identifiée")
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to create uncategorized bucket", e))?;

        self.find_uncategorized().await?.ok_or_else(|| {
            DomainError::database("Failed to create uncategorized bucket", "row missing after insert")
        })
    }
}

fn row_to_category(row: sqlx::postgres::PgRow) -> Result<Category, DomainError> {
    let id: i64 = column(&row, "id")?;
    let parent_id: Option<i64> = column(&row, "parent_id")?;
    let level: i16 = column(&row, "level")?;

    Ok(Category {
        id: CategoryId::new(id),
        name: column(&row, "name")?,
        abbreviation: column(&row, "abbreviation")?,
        parent_id: parent_id.map(CategoryId::new),
        level: level.clamp(0, u8::MAX as i16) as u8,
        is_active: column(&row, "is_active")?,
        description: column(&row, "description")?,
    })
}
