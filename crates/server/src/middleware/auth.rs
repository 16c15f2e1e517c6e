//! Bearer token extractors.
//!
//! Protected handlers take [`AuthUser`] or [`AdminUser`] as an argument. The
//! token is read from `Authorization: Bearer <token>`, verified, and the user
//! is loaded fresh from the database so deleted users and revoked admin
//! rights take effect immediately.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(AuthUser(user): AuthUser) -> Json<UserView> {
///     Json(user.into())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Extractor that requires a valid bearer token for an admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

/// Pull the token out of an `Authorization: Bearer` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Access denied. No token provided.".into()))?;

        let claims = state.tokens().verify(token)?;
        let user = AuthService::new(state.pool()).user(claims.user_id).await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            tracing::warn!(user_id = %user.id, "Non-admin attempted admin action");
            return Err(AppError::Forbidden(
                "Access denied. Admin privileges required.".into(),
            ));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/users/me");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_other_scheme_is_none() {
        assert_eq!(bearer_token(&parts_with(None)), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpw"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
    }
}
