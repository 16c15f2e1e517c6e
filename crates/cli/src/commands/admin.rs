//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! atelier-cli admin create -n "Admin Name" -u admin -e admin@example.com -p 'long passphrase'
//! ```
//!
//! The password can also be passed through `ATELIER_ADMIN_PASSWORD` to keep
//! it out of shell history.

use atelier_server::models::RegisterRequest;
use atelier_server::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::ConnectError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// User already exists.
    #[error("A user already exists with username {username} or email {email}")]
    UserExists { username: String, email: String },

    /// Validation or database failure while creating the user.
    #[error("Could not create admin: {0}")]
    Auth(#[from] AuthError),
}

/// Create a new admin user.
///
/// Goes through the same validation and hashing as `POST /api/users/register`.
///
/// # Returns
///
/// The ID of the created admin user.
pub async fn create_user(
    name: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i32, AdminError> {
    let pool = super::connect().await?;

    tracing::info!("Creating admin user: {} <{}>", username, email);

    let request = RegisterRequest {
        name: name.to_owned(),
        username: username.to_owned(),
        email: email.to_owned(),
        password: password.to_owned(),
        is_admin: true,
    };

    let user = AuthService::new(&pool)
        .register(&request)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists {
                username: username.to_owned(),
                email: email.to_owned(),
            },
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}, Email: {}",
        user.id,
        user.username,
        user.email
    );

    Ok(user.id.as_i32())
}
