//! Order placement.
//!
//! Validation, stock decrement and the order insert share one transaction.
//! Products are locked in ascending ID order before their stock is read, so
//! concurrent orders for the same product are serialized and can never
//! oversell.

use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use atelier_core::stock::{self, LineItem, StockError};
use atelier_core::{Money, ProductId, pricing};

use crate::db::RepositoryError;
use crate::db::orders::{self as order_rows, OrderAmounts, PricedLine};
use crate::models::{CheckoutRequest, OrderView};
use crate::services::settings::SettingsService;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A contact field is missing or malformed.
    #[error("{0}")]
    Invalid(String),

    /// The line items cannot be admitted against current stock.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Order placement service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    settings: &'a SettingsService,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, settings: &'a SettingsService) -> Self {
        Self { pool, settings }
    }

    /// Validate, decrement stock and store an order, all or nothing.
    ///
    /// The total is computed from current prices and the delivery rule. A
    /// client-supplied total is only compared.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Invalid` for bad contact fields,
    /// `OrderError::Stock` if any line cannot be served, and
    /// `OrderError::Repository` if the database fails. Nothing is written in
    /// any of these cases.
    #[instrument(skip(self, request), fields(lines = request.products.len()))]
    pub async fn place(&self, request: CheckoutRequest) -> Result<OrderView, OrderError> {
        let customer = request.customer().map_err(OrderError::Invalid)?;
        if request.products.is_empty() {
            return Err(StockError::EmptyOrder.into());
        }
        let policy = self.settings.policy().await?;

        let ids: Vec<ProductId> = request.products.iter().map(|l| l.product_id).collect();

        let mut tx = self.pool.begin().await?;
        let mut locked = order_rows::lock_products(&mut tx, &ids).await?;

        let decrements =
            stock::reserve(&mut locked.stock, &request.products).inspect_err(|err| {
                tracing::info!(error = %err, shortfall = ?err.shortfall(), "Order rejected");
            })?;
        order_rows::apply_decrements(&mut tx, &decrements).await?;

        let lines = price_lines(&request.products, &locked.prices)?;
        let subtotal = pricing::subtotal(
            request
                .products
                .iter()
                .zip(&lines)
                .map(|(item, line)| (line.unit_price, item.quantity)),
        );
        let quote = policy.quote(subtotal);

        if let Some(client_total) = request.total_amount
            && client_total != quote.total
        {
            tracing::warn!(
                client_total = %client_total,
                server_total = %quote.total,
                "Client total differs from computed total"
            );
        }

        let order = order_rows::insert_order(
            &mut tx,
            &customer,
            &lines,
            OrderAmounts {
                subtotal: quote.subtotal,
                shipping: quote.shipping,
                total: quote.total,
            },
        )
        .await?;

        // Read back inside the transaction; nothing after commit may fail
        let products = order_rows::order_lines(&mut *tx, &[order.id])
            .await?
            .remove(&order.id)
            .unwrap_or_default();
        let view = OrderView::new(order, products);
        tx.commit().await?;

        for decrement in &decrements {
            tracing::debug!(
                product_id = %decrement.product_id,
                size = ?decrement.target.size(),
                remaining = decrement.remaining,
                "Stock decremented"
            );
        }
        tracing::info!(order_id = %view.id, total = %quote.total, "Order placed");

        Ok(view)
    }
}

/// Attach the locked unit price to each line.
fn price_lines(
    items: &[LineItem],
    prices: &HashMap<ProductId, Money>,
) -> Result<Vec<PricedLine>, StockError> {
    items
        .iter()
        .map(|item| {
            let unit_price = prices
                .get(&item.product_id)
                .copied()
                .ok_or(StockError::ProductNotFound {
                    product_id: item.product_id,
                })?;
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                StockError::InvalidQuantity {
                    product_id: item.product_id,
                }
            })?;
            Ok(PricedLine {
                product_id: item.product_id,
                quantity,
                size: item.size.clone(),
                unit_price,
            })
        })
        .collect()
}
