//! Category route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use atelier_core::CategoryId;

use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::AdminUser;
use crate::models::{CategoryInput, CategoryView};
use crate::routes::MessageResponse;
use crate::state::AppState;

/// Response for create and edit.
#[derive(Debug, Serialize)]
pub struct CategorySaved {
    pub message: &'static str,
    pub category: CategoryView,
}

fn not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

/// List all categories.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CategoryView>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories.iter().map(CategoryView::from).collect()))
}

/// Create a category.
pub async fn create(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<CategorySaved>)> {
    let (name, image) = input.into_new().map_err(AppError::BadRequest)?;
    let category = CategoryRepository::new(state.pool())
        .create(&name, &image)
        .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((
        StatusCode::CREATED,
        Json(CategorySaved {
            message: "Category added successfully",
            category: (&category).into(),
        }),
    ))
}

/// Update a category's name and/or image.
pub async fn update(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<CategorySaved>> {
    let changes = input.into_changes().map_err(AppError::BadRequest)?;
    let category = CategoryRepository::new(state.pool())
        .update(id, &changes)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(category_id = %id, "Category updated");
    Ok(Json(CategorySaved {
        message: "Category updated successfully",
        category: (&category).into(),
    }))
}

/// Delete a category.
pub async fn remove(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<MessageResponse>> {
    if !CategoryRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
