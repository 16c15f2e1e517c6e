//! Product route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use atelier_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::AdminUser;
use crate::models::{ProductIds, ProductInput, ProductView};
use crate::routes::MessageResponse;
use crate::state::AppState;

/// Response for create and edit.
#[derive(Debug, Serialize)]
pub struct ProductSaved {
    pub message: &'static str,
    pub product: ProductView,
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// List all products.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// List products in a category.
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ProductView>>> {
    let products = ProductRepository::new(state.pool())
        .list_by_category(&category)
        .await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// Show one product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(product.into()))
}

/// Fetch products by ID (wishlist and cart pages).
pub async fn by_ids(
    State(state): State<AppState>,
    Json(body): Json<ProductIds>,
) -> Result<Json<Vec<ProductView>>> {
    if body.ids.is_empty() {
        return Err(AppError::BadRequest(
            "Invalid or empty IDs array".to_string(),
        ));
    }
    let products = ProductRepository::new(state.pool())
        .get_many(&body.ids)
        .await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// Create a product.
pub async fn create(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductSaved>)> {
    let featured = input.homepage;
    let draft = input.into_draft().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .create(&draft, featured)
        .await?;

    tracing::info!(product_id = %product.id, admin_id = %admin.id, "Product created");
    Ok((
        StatusCode::CREATED,
        Json(ProductSaved {
            message: "Product added successfully",
            product: product.into(),
        }),
    ))
}

/// Replace a product's fields and images.
pub async fn update(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductSaved>> {
    let featured = input.homepage;
    let kept = input.kept_image_indexes.clone();
    let draft = input.into_draft().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .update(id, &draft, &kept, featured)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(product_id = %id, admin_id = %admin.id, "Product updated");
    Ok(Json(ProductSaved {
        message: "Product updated successfully",
        product: product.into(),
    }))
}

/// Delete a product.
pub async fn remove(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }

    tracing::info!(product_id = %id, admin_id = %admin.id, "Product deleted");
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
