//! Cart route handlers.
//!
//! The cart itself lives on the client. These endpoints normalize whatever
//! layout the client persisted and price it against the current catalog.

use std::collections::HashMap;

use axum::extract::State;
use serde::Serialize;

use atelier_core::cart::Cart;
use atelier_core::{Money, ProductId, pricing};

use crate::db::products::ProductRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::state::AppState;

/// One priced cart line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub title: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    /// Units available on the counter this line draws from.
    pub available: i32,
    pub in_stock: bool,
}

/// Priced cart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub lines: Vec<QuoteLine>,
    /// Products in the cart that no longer exist.
    pub missing: Vec<ProductId>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub remaining_for_free_delivery: Option<Money>,
}

/// Normalize a persisted cart (legacy or current layout).
pub async fn reconcile(Json(cart): Json<Cart>) -> Json<Cart> {
    tracing::debug!(entries = cart.items().len(), count = cart.count(), "Cart reconciled");
    Json(cart)
}

/// Price a persisted cart with current prices and the delivery rule.
pub async fn quote(
    State(state): State<AppState>,
    Json(cart): Json<Cart>,
) -> Result<Json<CartQuote>> {
    let items = cart.line_items()?;
    let policy = state.settings().policy().await?;

    let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
    let products: HashMap<ProductId, _> = if ids.is_empty() {
        HashMap::new()
    } else {
        ProductRepository::new(state.pool())
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect()
    };

    let mut lines = Vec::with_capacity(items.len());
    let mut missing = Vec::new();
    for item in items {
        let Some(product) = products.get(&item.product_id) else {
            missing.push(item.product_id);
            continue;
        };

        let snapshot = product.stock_snapshot();
        let available = snapshot
            .target_for(item.size.as_deref())
            .map_or(0, |target| snapshot.available(&target));

        lines.push(QuoteLine {
            product_id: item.product_id,
            title: product.title.clone(),
            size: item.size,
            quantity: item.quantity,
            unit_price: product.price,
            line_total: product.price.times(item.quantity),
            available,
            in_stock: i64::from(available) >= i64::from(item.quantity),
        });
    }

    let subtotal = pricing::subtotal(lines.iter().map(|l| (l.unit_price, l.quantity)));
    let quote = policy.quote(subtotal);

    Ok(Json(CartQuote {
        lines,
        missing,
        subtotal: quote.subtotal,
        shipping: quote.shipping,
        total: quote.total,
        remaining_for_free_delivery: quote.remaining_for_free_delivery,
    }))
}
