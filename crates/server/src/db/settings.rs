//! Settings singleton repository.

use sqlx::PgPool;

use atelier_core::pricing::DeliveryPolicy;

use super::RepositoryError;
use crate::models::Settings;

/// Repository for the settings row.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read the settings, creating the default row on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self) -> Result<Settings, RepositoryError> {
        sqlx::query("INSERT INTO shop.settings (id) VALUES (true) ON CONFLICT (id) DO NOTHING")
            .execute(self.pool)
            .await?;

        let settings = sqlx::query_as::<_, Settings>(
            r"
            SELECT free_delivery_threshold, delivery_fee, created_at, updated_at
            FROM shop.settings
            WHERE id
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(settings)
    }

    /// Store a new delivery rule, creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, policy: &DeliveryPolicy) -> Result<Settings, RepositoryError> {
        let settings = sqlx::query_as::<_, Settings>(
            r"
            INSERT INTO shop.settings (id, free_delivery_threshold, delivery_fee)
            VALUES (true, $1, $2)
            ON CONFLICT (id) DO UPDATE
            SET free_delivery_threshold = EXCLUDED.free_delivery_threshold,
                delivery_fee = EXCLUDED.delivery_fee,
                updated_at = now()
            RETURNING free_delivery_threshold, delivery_fee, created_at, updated_at
            ",
        )
        .bind(policy.free_delivery_threshold)
        .bind(policy.delivery_fee)
        .fetch_one(self.pool)
        .await?;
        Ok(settings)
    }
}
