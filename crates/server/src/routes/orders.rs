//! Order route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use atelier_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::Json;
use crate::middleware::AdminUser;
use crate::models::{CheckoutRequest, OrderView, StatusUpdate};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Response for a placed order.
#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub message: &'static str,
    pub order: OrderView,
}

/// Response for the order count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCount {
    pub total_orders: i64,
}

/// Place an order. Cash on delivery, no account needed.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    add_breadcrumb("checkout", "Order submitted", None);

    let order = OrderService::new(state.pool(), state.settings())
        .place(request)
        .await?;

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));
    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            message: "Order created successfully",
            order,
        }),
    ))
}

/// Number of orders ever placed.
pub async fn total(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> Result<Json<OrderCount>> {
    let total_orders = OrderRepository::new(state.pool()).count().await?;
    Ok(Json(OrderCount { total_orders }))
}

/// All orders, newest first.
pub async fn index(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool()).list().await?;
    Ok(Json(orders))
}

/// Set an order's status.
pub async fn update_status(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<OrderView>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    tracing::info!(order_id = %id, status = %body.status, admin_id = %admin.id, "Order status updated");
    Ok(Json(order))
}
