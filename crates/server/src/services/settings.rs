//! Delivery settings with an in-memory cache.
//!
//! Settings are read on every checkout and every cart quote, so the singleton
//! row is cached with `moka` (60-second TTL) and invalidated on update.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use atelier_core::pricing::{DeliveryPolicy, PricingError};

use crate::db::RepositoryError;
use crate::db::settings::SettingsRepository;
use crate::models::{Settings, SettingsUpdate};

const CACHE_TTL: Duration = Duration::from_secs(60);

/// Errors from updating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The resulting delivery rule is invalid.
    #[error(transparent)]
    Invalid(#[from] PricingError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Settings access shared across handlers.
#[derive(Clone)]
pub struct SettingsService {
    inner: Arc<SettingsServiceInner>,
}

struct SettingsServiceInner {
    pool: PgPool,
    cache: Cache<(), Settings>,
}

impl SettingsService {
    /// Create a settings service backed by the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(SettingsServiceInner { pool, cache }),
        }
    }

    /// Current settings, creating the defaults on first read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the row cannot be read.
    pub async fn get(&self) -> Result<Settings, RepositoryError> {
        if let Some(settings) = self.inner.cache.get(&()).await {
            return Ok(settings);
        }

        let settings = SettingsRepository::new(&self.inner.pool)
            .get_or_create()
            .await?;
        self.inner.cache.insert((), settings.clone()).await;
        Ok(settings)
    }

    /// Current delivery rule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the row cannot be read.
    pub async fn policy(&self) -> Result<DeliveryPolicy, RepositoryError> {
        self.get().await.map(|settings| settings.policy())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` if either amount would be negative.
    #[instrument(skip(self))]
    pub async fn update(&self, update: &SettingsUpdate) -> Result<Settings, SettingsError> {
        let current = SettingsRepository::new(&self.inner.pool)
            .get_or_create()
            .await?;
        let policy = update.apply(current.policy());
        policy.validate()?;

        let settings = SettingsRepository::new(&self.inner.pool)
            .save(&policy)
            .await?;
        self.inner.cache.invalidate(&()).await;

        tracing::info!(
            free_delivery_threshold = ?settings.free_delivery_threshold,
            delivery_fee = %settings.delivery_fee,
            "Settings updated"
        );
        Ok(settings)
    }
}
