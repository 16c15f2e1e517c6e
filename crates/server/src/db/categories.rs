//! Category repository.

use sqlx::PgPool;

use atelier_core::CategoryId;

use super::RepositoryError;
use crate::models::{Category, CategoryChanges};

const DUPLICATE_NAME: &str = "A category with this name already exists";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, image, created_at FROM shop.category ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, name: &str, image: &[u8]) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO shop.category (name, image)
            VALUES ($1, $2)
            RETURNING id, name, image, created_at
            ",
        )
        .bind(name)
        .bind(image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, DUPLICATE_NAME))
    }

    /// Apply changes to a category. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        changes: &CategoryChanges,
    ) -> Result<Option<Category>, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            UPDATE shop.category
            SET name = COALESCE($2, name), image = COALESCE($3, image)
            WHERE id = $1
            RETURNING id, name, image, created_at
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.image.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, DUPLICATE_NAME))
    }

    /// Delete a category. Returns whether it existed.
    ///
    /// Products keep their category name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
