//! Sales channel resolution from publishable API keys.
//!
//! Storefront requests carry an `x-publishable-api-key` header. The commerce
//! backend links each key to one or more sales channels; the wishlist is
//! scoped to the first of them.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use wishlist_core::SalesChannelId;

/// Errors from sales channel resolution.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Maps publishable API keys to sales channels.
#[async_trait]
pub trait SalesChannelResolver: Send + Sync {
    /// Sales channels associated with the key, oldest link first.
    ///
    /// Unknown or revoked keys resolve to an empty list.
    async fn resolve(&self, publishable_key: &str) -> Result<Vec<SalesChannelId>, ResolverError>;
}

/// Resolver backed by the commerce backend's key tables.
#[derive(Clone)]
pub struct PgSalesChannelResolver {
    pool: PgPool,
}

impl PgSalesChannelResolver {
    /// Create a new resolver.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalesChannelResolver for PgSalesChannelResolver {
    #[instrument(skip(self, publishable_key))]
    async fn resolve(&self, publishable_key: &str) -> Result<Vec<SalesChannelId>, ResolverError> {
        let channels = sqlx::query_scalar::<_, SalesChannelId>(
            r"
            SELECT link.sales_channel_id
            FROM publishable_api_key_sales_channel link
            JOIN api_key ON api_key.id = link.publishable_key_id
            WHERE api_key.token = $1
              AND api_key.type = 'publishable'
              AND api_key.revoked_at IS NULL
              AND api_key.deleted_at IS NULL
              AND link.deleted_at IS NULL
            ORDER BY link.created_at ASC, link.sales_channel_id ASC
            ",
        )
        .bind(publishable_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }
}

/// Fixed key-to-channel map, for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct StaticSalesChannelResolver {
    keys: HashMap<String, Vec<SalesChannelId>>,
}

impl StaticSalesChannelResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `key` with `channels`.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>, channels: Vec<SalesChannelId>) -> Self {
        self.keys.insert(key.into(), channels);
        self
    }
}

#[async_trait]
impl SalesChannelResolver for StaticSalesChannelResolver {
    async fn resolve(&self, publishable_key: &str) -> Result<Vec<SalesChannelId>, ResolverError> {
        Ok(self.keys.get(publishable_key).cloned().unwrap_or_default())
    }
}
