//! Homepage (featured products) route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use atelier_core::ProductId;

use crate::db::RepositoryError;
use crate::db::homepage::HomepageRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::AdminUser;
use crate::models::ProductView;
use crate::routes::MessageResponse;
use crate::state::AppState;

/// A featured product with the product populated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageEntry {
    pub product_id: ProductId,
    pub product: ProductView,
}

/// Body of `POST /api/homepage-products/add`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequest {
    pub product_id: ProductId,
}

/// List featured products, in the order they were featured.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<HomepageEntry>>> {
    let products = HomepageRepository::new(state.pool()).list().await?;
    Ok(Json(
        products
            .into_iter()
            .map(|product| HomepageEntry {
                product_id: product.id,
                product: product.into(),
            })
            .collect(),
    ))
}

/// Feature a product.
pub async fn add(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<FeatureRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    HomepageRepository::new(state.pool())
        .add(body.product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
            RepositoryError::Conflict(msg) => AppError::BadRequest(msg),
            other => other.into(),
        })?;

    tracing::info!(product_id = %body.product_id, "Product featured");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Product added to homepage")),
    ))
}

/// Stop featuring a product.
pub async fn remove(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    if !HomepageRepository::new(state.pool())
        .remove(product_id)
        .await?
    {
        return Err(AppError::NotFound(
            "Product not found in homepage collection".to_string(),
        ));
    }

    tracing::info!(product_id = %product_id, "Product removed from homepage");
    Ok(Json(MessageResponse::new("Product removed from homepage")))
}
