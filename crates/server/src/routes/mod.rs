//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                 - Liveness
//! GET    /health/ready                           - Readiness (database ping)
//!
//! # Products
//! GET    /api/products                           - All products
//! GET    /api/products/category/{category}       - Products in a category
//! GET    /api/products/{id}                      - One product
//! POST   /api/products/ids                       - Products by ID list
//! POST   /api/products/add                       - Create (admin)
//! PUT    /api/products/edit/{id}                 - Replace (admin)
//! DELETE /api/products/delete/{id}               - Delete (admin)
//!
//! # Homepage
//! GET    /api/homepage-products                  - Featured products
//! POST   /api/homepage-products/add              - Feature (admin)
//! DELETE /api/homepage-products/delete/{id}      - Un-feature (admin)
//!
//! # Categories
//! GET    /api/categories                         - All categories
//! POST   /api/categories/add                     - Create (admin)
//! PUT    /api/categories/edit/{id}               - Update (admin)
//! DELETE /api/categories/delete/{id}             - Delete (admin)
//!
//! # Orders
//! POST   /api/orders/create                      - Place an order
//! GET    /api/orders/total-orders                - Order count (admin)
//! GET    /api/orders/all-orders                  - All orders (admin)
//! PUT    /api/orders/update-status/{id}          - Set status (admin)
//!
//! # Cart
//! POST   /api/cart/reconcile                     - Normalize a stored cart
//! POST   /api/cart/quote                         - Price a stored cart
//!
//! # Users
//! POST   /api/users/login                        - Login (rate limited)
//! POST   /api/users/register                     - Create user (admin)
//! GET    /api/users/me                           - Current user
//! GET    /api/users/admin                        - Admin probe
//! POST   /api/users/change-password              - Change password
//!
//! # Settings
//! GET    /api/settings                           - Delivery settings
//! PUT    /api/settings                           - Update (admin)
//! ```

pub mod cart;
pub mod categories;
pub mod homepage;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Serialize;

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Body of responses that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/category/{category}", get(products::by_category))
        .route("/ids", post(products::by_ids))
        .route("/add", post(products::create))
        .route("/edit/{id}", put(products::update))
        .route("/delete/{id}", delete(products::remove))
        .route("/{id}", get(products::show))
}

/// Create the homepage routes router.
pub fn homepage_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(homepage::index))
        .route("/add", post(homepage::add))
        .route("/delete/{product_id}", delete(homepage::remove))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/add", post(categories::create))
        .route("/edit/{id}", put(categories::update))
        .route("/delete/{id}", delete(categories::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(orders::create))
        .route("/total-orders", get(orders::total))
        .route("/all-orders", get(orders::index))
        .route("/update-status/{id}", put(orders::update_status))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/reconcile", post(cart::reconcile))
        .route("/quote", post(cart::quote))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(users::login).layer(auth_rate_limiter()),
        )
        .route("/register", post(users::register))
        .route("/me", get(users::me))
        .route("/admin", get(users::admin))
        .route("/change-password", post(users::change_password))
}

/// Create the settings routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/", get(settings::show).put(settings::update))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/products", product_routes())
        .nest("/api/homepage-products", homepage_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/users", user_routes())
        .nest("/api/settings", settings_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
