//! Order repository and the row-level steps of order placement.
//!
//! Placement runs inside one transaction owned by the caller:
//!
//! 1. [`lock_products`] takes `FOR UPDATE` locks on every product in the
//!    order, in ascending ID order, and returns their stock counters.
//! 2. The caller validates and plans the decrements against that snapshot.
//! 3. [`apply_decrements`] writes them with conditional updates.
//! 4. [`insert_order`] stores the order and its lines.
//!
//! Dropping the transaction at any point rolls every step back.

use std::collections::{BTreeMap, HashMap};

use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::instrument;

use atelier_core::stock::{ProductStock, SizeStock, StockDecrement, StockTarget};
use atelier_core::{Money, OrderId, OrderStatus, ProductId};

use super::RepositoryError;
use crate::models::{Customer, OrderItemRow, OrderLineView, OrderRow, OrderView};

/// Stock and prices of the products in an order, read under row locks.
#[derive(Debug, Clone, Default)]
pub struct LockedProducts {
    pub stock: BTreeMap<ProductId, ProductStock>,
    pub prices: HashMap<ProductId, Money>,
}

/// An order line ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: Option<String>,
    pub unit_price: Money,
}

/// Order amounts computed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAmounts {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedRow {
    id: ProductId,
    title: String,
    price: Money,
    stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedSizeRow {
    product_id: ProductId,
    size: String,
    stock: i32,
}

/// Lock the given products and read their stock and prices.
///
/// Unknown IDs are simply absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
#[instrument(skip(conn), fields(count = ids.len()))]
pub async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<LockedProducts, RepositoryError> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let rows = sqlx::query_as::<_, LockedRow>(
        r"
        SELECT id, title, price, stock
        FROM shop.product
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    // Size rows are only written while their product row is locked.
    let size_rows = sqlx::query_as::<_, LockedSizeRow>(
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

    let mut sizes: HashMap<ProductId, Vec<SizeStock>> = HashMap::new();
    for row in size_rows {
        sizes
            .entry(row.product_id)
            .or_default()
            .push(SizeStock::new(row.size, row.stock));
    }

    let mut locked = LockedProducts::default();
    for row in rows {
        locked.prices.insert(row.id, row.price);
        locked.stock.insert(
            row.id,
            ProductStock {
                id: row.id,
                title: row.title,
                sizes: sizes.remove(&row.id).unwrap_or_default(),
                stock: row.stock,
            },
        );
    }
    Ok(locked)
}

/// Write planned decrements.
///
/// Each update only applies if the counter still covers the quantity, so a
/// stale plan fails instead of driving stock negative.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if a counter no longer covers its
/// decrement, or `RepositoryError::Database` if a query fails.
#[instrument(skip_all, fields(count = decrements.len()))]
pub async fn apply_decrements(
    conn: &mut PgConnection,
    decrements: &[StockDecrement],
) -> Result<(), RepositoryError> {
    for decrement in decrements {
        let result = match &decrement.target {
            StockTarget::Flat => {
                sqlx::query(
                    r"
                    UPDATE shop.product
                    SET stock = stock - $2, updated_at = now()
                    WHERE id = $1 AND stock >= $2
                    ",
                )
                .bind(decrement.product_id)
                .bind(decrement.quantity)
                .execute(&mut *conn)
                .await?
            }
            StockTarget::Size(size) => {
                sqlx::query(
                    r"
                    UPDATE shop.product_size
                    SET stock = stock - $3
                    WHERE product_id = $1 AND size = $2 AND stock >= $3
                    ",
                )
                .bind(decrement.product_id)
                .bind(size)
                .bind(decrement.quantity)
                .execute(&mut *conn)
                .await?
            }
        };

        if result.rows_affected() != 1 {
            return Err(RepositoryError::Conflict(format!(
                "stock for product {} changed during checkout",
                decrement.product_id
            )));
        }
    }
    Ok(())
}

/// Insert an order and its lines.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
#[instrument(skip_all, fields(lines = lines.len()))]
pub async fn insert_order(
    conn: &mut PgConnection,
    customer: &Customer,
    lines: &[PricedLine],
    amounts: OrderAmounts,
) -> Result<OrderRow, RepositoryError> {
    let order = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO shop.customer_order
            (first_name, last_name, city, address, phone, email, additional_info,
             subtotal, shipping, total_amount)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, first_name, last_name, city, address, phone, email, additional_info,
                  subtotal, shipping, total_amount, status, created_at
        ",
    )
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.city)
    .bind(&customer.address)
    .bind(&customer.phone)
    .bind(&customer.email)
    .bind(&customer.additional_info)
    .bind(amounts.subtotal)
    .bind(amounts.shipping)
    .bind(amounts.total)
    .fetch_one(&mut *conn)
    .await?;

    for (position, line) in (0_i32..).zip(lines) {
        sqlx::query(
            r"
            INSERT INTO shop.order_item (order_id, position, product_id, quantity, size, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(order.id)
        .bind(position)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.size.as_deref())
        .bind(line.unit_price)
        .execute(&mut *conn)
        .await?;
    }

    Ok(order)
}

/// Read an order's lines back with product names and first images.
///
/// Runs on any executor, so placement can read its own uncommitted order
/// inside the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn order_lines<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[OrderId],
) -> Result<HashMap<OrderId, Vec<OrderLineView>>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT i.order_id, i.product_id, i.quantity, i.size, i.unit_price,
               p.title AS product_name,
               (SELECT img.data FROM shop.product_image img
                WHERE img.product_id = i.product_id
                ORDER BY img.position LIMIT 1) AS image
        FROM shop.order_item i
        LEFT JOIN shop.product p ON p.id = i.product_id
        WHERE i.order_id = ANY($1)
        ORDER BY i.order_id, i.position
        ",
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(group_lines(rows))
}

/// Group line rows by order, keeping their stored order.
fn group_lines(rows: Vec<OrderItemRow>) -> HashMap<OrderId, Vec<OrderLineView>> {
    let mut lines: HashMap<OrderId, Vec<OrderLineView>> = HashMap::new();
    for row in rows {
        lines.entry(row.order_id).or_default().push(row.into());
    }
    lines
}

/// Repository for reading and updating placed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Number of orders ever placed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM shop.customer_order")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// All orders, newest first, with lines populated from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<OrderView>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, first_name, last_name, city, address, phone, email, additional_info,
                   subtotal, shipping, total_amount, status, created_at
            FROM shop.customer_order
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let mut lines = order_lines(self.pool, &ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let products = lines.remove(&order.id).unwrap_or_default();
                OrderView::new(order, products)
            })
            .collect())
    }

    /// One order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderView>, RepositoryError> {
        let order = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, first_name, last_name, city, address, phone, email, additional_info,
                   subtotal, shipping, total_amount, status, created_at
            FROM shop.customer_order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };
        let products = order_lines(self.pool, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(Some(OrderView::new(order, products)))
    }

    /// Set an order's status. Returns the updated order, or `None` if it
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, RepositoryError> {
        let result = sqlx::query("UPDATE shop.customer_order SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::models::order::UNKNOWN_PRODUCT;

    fn row(order: i32, product: i32, name: Option<&str>) -> OrderItemRow {
        OrderItemRow {
            order_id: OrderId::new(order),
            product_id: ProductId::new(product),
            quantity: 1,
            size: None,
            unit_price: Money::from_units(100),
            product_name: name.map(str::to_owned),
            image: None,
        }
    }

    #[test]
    fn test_group_lines_keeps_row_order_per_order() {
        let lines = group_lines(vec![
            row(1, 10, Some("Kurta")),
            row(1, 11, Some("Dupatta")),
            row(2, 10, Some("Kurta")),
        ]);

        let first = &lines[&OrderId::new(1)];
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].product_name, "Kurta");
        assert_eq!(first[1].product_name, "Dupatta");
        assert_eq!(lines[&OrderId::new(2)].len(), 1);
    }

    #[test]
    fn test_group_lines_names_deleted_products() {
        let lines = group_lines(vec![row(3, 99, None)]);
        let line = &lines[&OrderId::new(3)][0];
        assert_eq!(line.product_name, UNKNOWN_PRODUCT);
        assert!(line.image_url.is_none());
    }
}
