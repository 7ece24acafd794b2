//! Catalog lookups for variant validation and wishlist enrichment.
//!
//! The `product` and `product_variant` tables belong to the commerce backend;
//! this module only reads them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use wishlist_core::{CatalogProduct, CatalogVariant, ProductId, ProductStatus, VariantId};

/// Errors from catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A catalog row could not be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Read-only view of the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a non-deleted variant.
    async fn get_variant(&self, id: &VariantId) -> Result<Option<CatalogVariant>, CatalogError>;

    /// Look up a non-deleted product.
    async fn get_product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, CatalogError>;

    /// Whether a non-deleted variant with this ID exists.
    async fn variant_exists(&self, id: &VariantId) -> Result<bool, CatalogError> {
        Ok(self.get_variant(id).await?.is_some())
    }
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// Catalog backed by the commerce backend's `PostgreSQL` tables.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Create a new catalog reader.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    handle: String,
    thumbnail: Option<String>,
    status: String,
}

impl TryFrom<ProductRow> for CatalogProduct {
    type Error = CatalogError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let status: ProductStatus = row.status.parse().map_err(|e: String| {
            CatalogError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            handle: row.handle,
            thumbnail: row.thumbnail,
            status,
        })
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    #[instrument(skip(self))]
    async fn get_variant(&self, id: &VariantId) -> Result<Option<CatalogVariant>, CatalogError> {
        let variant = sqlx::query_as::<_, CatalogVariant>(
            r"
            SELECT id, product_id, sku, title
            FROM product_variant
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, handle, thumbnail, status
            FROM product
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogProduct::try_from).transpose()
    }
}

// =============================================================================
// Cache
// =============================================================================

/// TTL cache in front of another catalog.
///
/// Only hits are cached, so a variant created after a miss becomes visible
/// on the next lookup. `variant_exists` bypasses the cache: writes validate
/// against the live catalog.
pub struct CachedCatalog<C> {
    inner: C,
    variants: Cache<VariantId, CatalogVariant>,
    products: Cache<ProductId, CatalogProduct>,
}

impl<C: Catalog> CachedCatalog<C> {
    /// Wrap `inner` with caches holding up to `capacity` entries each.
    #[must_use]
    pub fn new(inner: C, ttl: Duration, capacity: u64) -> Self {
        Self {
            inner,
            variants: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            products: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.variants.invalidate_all();
        self.products.invalidate_all();
    }
}

#[async_trait]
impl<C: Catalog> Catalog for CachedCatalog<C> {
    async fn get_variant(&self, id: &VariantId) -> Result<Option<CatalogVariant>, CatalogError> {
        if let Some(variant) = self.variants.get(id).await {
            return Ok(Some(variant));
        }

        let variant = self.inner.get_variant(id).await?;
        if let Some(ref v) = variant {
            self.variants.insert(id.clone(), v.clone()).await;
        }
        Ok(variant)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        if let Some(product) = self.products.get(id).await {
            return Ok(Some(product));
        }

        let product = self.inner.get_product(id).await?;
        if let Some(ref p) = product {
            self.products.insert(id.clone(), p.clone()).await;
        }
        Ok(product)
    }

    async fn variant_exists(&self, id: &VariantId) -> Result<bool, CatalogError> {
        self.inner.variant_exists(id).await
    }
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Default)]
struct CatalogData {
    variants: HashMap<VariantId, CatalogVariant>,
    products: HashMap<ProductId, CatalogProduct>,
}

/// Catalog held in memory, for tests and database-less local runs.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    data: Arc<RwLock<CatalogData>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a product.
    pub fn insert_product(&self, product: CatalogProduct) {
        if let Ok(mut data) = self.data.write() {
            data.products.insert(product.id.clone(), product);
        }
    }

    /// Add or replace a variant.
    pub fn insert_variant(&self, variant: CatalogVariant) {
        if let Ok(mut data) = self.data.write() {
            data.variants.insert(variant.id.clone(), variant);
        }
    }

    /// Remove a variant, as if it had been deleted from the catalog.
    pub fn remove_variant(&self, id: &VariantId) {
        if let Ok(mut data) = self.data.write() {
            data.variants.remove(id);
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, CatalogData>, CatalogError> {
        self.data
            .read()
            .map_err(|_| CatalogError::DataCorruption("catalog lock poisoned".to_owned()))
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_variant(&self, id: &VariantId) -> Result<Option<CatalogVariant>, CatalogError> {
        Ok(self.read()?.variants.get(id).cloned())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.read()?.products.get(id).cloned())
    }
}
