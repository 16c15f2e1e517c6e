//! Bearer tokens (HS256 JWT).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use atelier_core::UserId;

use super::AuthError;
use crate::models::User;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: UserId,
    /// Admin flag at issue time. Authorization re-checks the stored user.
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    /// Create keys from a shared secret.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: user.id,
            is_admin: user.is_admin,
            iat,
            exp: iat.saturating_add(ttl),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenSigning)
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any verification failure.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::Email;

    use super::*;

    fn keys(secret: &str, ttl: u64) -> TokenKeys {
        TokenKeys::new(&SecretString::from(secret), Duration::from_secs(ttl))
    }

    fn user(is_admin: bool) -> User {
        User {
            id: UserId::new(42),
            name: "Sana".to_string(),
            username: "sana".to_string(),
            email: Email::parse("sana@example.com").unwrap(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys("kP9$wQ2!zR7@tY4#uI1%oA6^sD3&fG8*", 3600);
        let token = keys.issue(&user(true)).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.user_id, UserId::new(42));
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejects_other_key() {
        let token = keys("kP9$wQ2!zR7@tY4#uI1%oA6^sD3&fG8*", 3600)
            .issue(&user(false))
            .unwrap();
        let other = keys("mN5&bV8*cX1!zL4@kJ7#hG0$fD3%sA6^", 3600);
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_rejects_garbage_and_expired() {
        let keys_now = keys("kP9$wQ2!zR7@tY4#uI1%oA6^sD3&fG8*", 3600);
        assert!(matches!(keys_now.verify("not.a.token"), Err(AuthError::InvalidToken)));

        let claims = Claims {
            user_id: UserId::new(1),
            is_admin: false,
            iat: 1_000,
            exp: 2_000,
        };
        let expired = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"kP9$wQ2!zR7@tY4#uI1%oA6^sD3&fG8*"),
        )
        .unwrap();
        assert!(matches!(keys_now.verify(&expired), Err(AuthError::InvalidToken)));
    }
}
