//! User and authentication route handlers.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use crate::error::Result;
use crate::extract::Json;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, UserView};
use crate::routes::MessageResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Response wrapping a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserView,
}

/// Response for a registration.
#[derive(Debug, Serialize)]
pub struct UserRegistered {
    pub message: &'static str,
    pub user: UserView,
}

/// Exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;
    let token = state.tokens().issue(&user)?;

    Ok(Json(LoginResponse {
        token,
        user: (&user).into(),
    }))
}

/// Create a user. Only admins can register users.
pub async fn register(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserRegistered>)> {
    let user = AuthService::new(state.pool()).register(&body).await?;

    tracing::info!(user_id = %user.id, admin_id = %admin.id, "User created by admin");
    Ok((
        StatusCode::CREATED,
        Json(UserRegistered {
            message: "User registered successfully",
            user: (&user).into(),
        }),
    ))
}

/// The user the token belongs to.
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        user: (&user).into(),
    })
}

/// Succeeds only for admins.
pub async fn admin(AdminUser(_): AdminUser) -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome, Admin!"))
}

/// Change the current user's password.
pub async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool())
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
