//! Product repository.
//!
//! Products are stored across three tables: the product row itself, its
//! ordered images and its ordered size breakdown. Reads load the children for
//! a whole batch of products in two extra queries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use atelier_core::stock::SizeStock;
use atelier_core::{Money, ProductId};

use super::RepositoryError;
use super::homepage;
use crate::models::{Product, ProductDraft};

#[derive(Debug, sqlx::FromRow)]
struct ProductRecord {
    id: ProductId,
    category: String,
    title: String,
    price: Money,
    description: String,
    design_details: String,
    stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRecord {
    product_id: ProductId,
    data: Vec<u8>,
}

#[derive(Debug, sqlx::FromRow)]
struct SizeRecord {
    product_id: ProductId,
    size: String,
    stock: i32,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let records = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, category, title, price, description, design_details, stock,
                   created_at, updated_at
            FROM shop.product
            ORDER BY id
            ",
        )
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut conn, records).await
    }

    /// Products whose category name matches exactly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let records = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, category, title, price, description, design_details, stock,
                   created_at, updated_at
            FROM shop.product
            WHERE category = $1
            ORDER BY id
            ",
        )
        .bind(category)
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut conn, records).await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.get_many(&[id]).await?;
        Ok(products.into_iter().next())
    }

    /// Products with any of the given IDs. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let records = sqlx::query_as::<_, ProductRecord>(
            r"
            SELECT id, category, title, price, description, design_details, stock,
                   created_at, updated_at
            FROM shop.product
            WHERE id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut conn, records).await
    }

    /// Create a product, optionally featuring it on the homepage.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(
        &self,
        draft: &ProductDraft,
        featured: bool,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            INSERT INTO shop.product (category, title, price, description, design_details, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, category, title, price, description, design_details, stock,
                      created_at, updated_at
            ",
        )
        .bind(&draft.category)
        .bind(&draft.title)
        .bind(draft.price)
        .bind(&draft.description)
        .bind(&draft.design_details)
        .bind(draft.stock)
        .fetch_one(&mut *tx)
        .await?;

        write_images(&mut tx, record.id, &draft.images).await?;
        write_sizes(&mut tx, record.id, &draft.sizes).await?;
        if featured {
            homepage::feature(&mut tx, record.id).await?;
        }

        tx.commit().await?;

        Ok(assemble(record, draft.images.clone(), draft.sizes.clone()))
    }

    /// Replace a product's fields.
    ///
    /// The new image list is the existing images at `kept_image_indexes` (in
    /// that order, out-of-range positions ignored) followed by the draft's
    /// images. The homepage entry is added or removed to match `featured`.
    ///
    /// Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, draft, kept_image_indexes), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        kept_image_indexes: &[usize],
        featured: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so a concurrent order sees either the old or the new sizes.
        let exists: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM shop.product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let current_images: Vec<Vec<u8>> = sqlx::query_scalar(
            "SELECT data FROM shop.product_image WHERE product_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let images: Vec<Vec<u8>> = kept_image_indexes
            .iter()
            .filter_map(|&index| current_images.get(index).cloned())
            .chain(draft.images.iter().cloned())
            .collect();

        let record = sqlx::query_as::<_, ProductRecord>(
            r"
            UPDATE shop.product
            SET category = $2, title = $3, price = $4, description = $5,
                design_details = $6, stock = $7, updated_at = now()
            WHERE id = $1
            RETURNING id, category, title, price, description, design_details, stock,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&draft.category)
        .bind(&draft.title)
        .bind(draft.price)
        .bind(&draft.description)
        .bind(&draft.design_details)
        .bind(draft.stock)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM shop.product_image WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shop.product_size WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        write_images(&mut tx, id, &images).await?;
        write_sizes(&mut tx, id, &draft.sizes).await?;

        if featured {
            homepage::feature(&mut tx, id).await?;
        } else {
            homepage::unfeature(&mut tx, id).await?;
        }

        tx.commit().await?;

        Ok(Some(assemble(record, images, draft.sizes.clone())))
    }

    /// Delete a product. Its images, sizes and homepage entry go with it.
    ///
    /// Returns whether a product was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Attach images and sizes to a batch of product rows.
async fn hydrate(
    conn: &mut PgConnection,
    records: Vec<ProductRecord>,
) -> Result<Vec<Product>, RepositoryError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<ProductId> = records.iter().map(|r| r.id).collect();

    let image_rows = sqlx::query_as::<_, ImageRecord>(
        r"
        SELECT product_id, data
        FROM shop.product_image
        WHERE product_id = ANY($1)
        ORDER BY product_id, position
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let size_rows = sqlx::query_as::<_, SizeRecord>(
        r"
        SELECT product_id, size, stock
        FROM shop.product_size
        WHERE product_id = ANY($1)
        ORDER BY product_id, position
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut images: HashMap<ProductId, Vec<Vec<u8>>> = HashMap::new();
    for row in image_rows {
        images.entry(row.product_id).or_default().push(row.data);
    }
    let mut sizes: HashMap<ProductId, Vec<SizeStock>> = HashMap::new();
    for row in size_rows {
        sizes
            .entry(row.product_id)
            .or_default()
            .push(SizeStock::new(row.size, row.stock));
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let id = record.id;
            assemble(
                record,
                images.remove(&id).unwrap_or_default(),
                sizes.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

fn assemble(record: ProductRecord, images: Vec<Vec<u8>>, sizes: Vec<SizeStock>) -> Product {
    Product {
        id: record.id,
        category: record.category,
        title: record.title,
        price: record.price,
        images,
        description: record.description,
        design_details: record.design_details,
        sizes,
        stock: record.stock,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

async fn write_images(
    conn: &mut PgConnection,
    id: ProductId,
    images: &[Vec<u8>],
) -> Result<(), sqlx::Error> {
    for (position, data) in (0_i32..).zip(images) {
        sqlx::query(
            "INSERT INTO shop.product_image (product_id, position, data) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(position)
        .bind(data)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn write_sizes(
    conn: &mut PgConnection,
    id: ProductId,
    sizes: &[SizeStock],
) -> Result<(), sqlx::Error> {
    for (position, entry) in (0_i32..).zip(sizes) {
        sqlx::query(
            "INSERT INTO shop.product_size (product_id, position, size, stock) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(position)
        .bind(&entry.size)
        .bind(entry.stock)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
