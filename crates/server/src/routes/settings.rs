//! Settings route handlers.

use axum::extract::State;
use serde::Serialize;

use crate::error::Result;
use crate::extract::Json;
use crate::middleware::AdminUser;
use crate::models::{Settings, SettingsUpdate};
use crate::state::AppState;

/// Response for an update.
#[derive(Debug, Serialize)]
pub struct SettingsSaved {
    pub message: &'static str,
    pub settings: Settings,
}

/// Current settings. The defaults are created on first read.
pub async fn show(State(state): State<AppState>) -> Result<Json<Settings>> {
    Ok(Json(state.settings().get().await?))
}

/// Partially update the settings.
pub async fn update(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<SettingsUpdate>,
) -> Result<Json<SettingsSaved>> {
    let settings = state.settings().update(&body).await?;
    Ok(Json(SettingsSaved {
        message: "Settings updated successfully",
        settings,
    }))
}
