//! Homepage (featured product) repository.

use sqlx::{PgConnection, PgPool};

use atelier_core::ProductId;

use super::RepositoryError;
use super::products::ProductRepository;
use crate::models::Product;

/// Repository for featured products.
pub struct HomepageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HomepageRepository<'a> {
    /// Create a new homepage repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Featured products in the order they were featured.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<ProductId> = sqlx::query_scalar(
            "SELECT product_id FROM shop.homepage_product ORDER BY created_at, id",
        )
        .fetch_all(self.pool)
        .await?;

        let mut products = ProductRepository::new(self.pool).get_many(&ids).await?;
        products.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(products)
    }

    /// Feature a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist and
    /// `RepositoryError::Conflict` if it is already featured.
    pub async fn add(&self, product_id: ProductId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.product WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        if feature(&mut conn, product_id).await? {
            Ok(())
        } else {
            Err(RepositoryError::Conflict(
                "Product already exists on homepage".to_owned(),
            ))
        }
    }

    /// Stop featuring a product. Returns whether it was featured.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, product_id: ProductId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(unfeature(&mut conn, product_id).await?)
    }
}

/// Feature a product if it is not already. Returns whether a row was added.
pub(crate) async fn feature(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO shop.homepage_product (product_id) VALUES ($1) ON CONFLICT (product_id) DO NOTHING",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove a product from the homepage. Returns whether a row was removed.
pub(crate) async fn unfeature(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM shop.homepage_product WHERE product_id = $1")
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
