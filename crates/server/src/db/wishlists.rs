//! `PostgreSQL` wishlist repository.
//!
//! Uses runtime-checked queries so the crate builds without a live database.
//! Soft-deleted rows are excluded everywhere except the restore paths.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use wishlist_core::{
    CustomerId, SalesChannelId, VariantId, Wishlist, WishlistId, WishlistItem, WishlistItemId,
};

use super::{RepositoryError, WishlistStore, map_unique_violation};

/// Wishlist store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgWishlistStore {
    pool: PgPool,
}

impl PgWishlistStore {
    /// Create a new wishlist store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WishlistStore for PgWishlistStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
    ) -> Result<Option<Wishlist>, RepositoryError> {
        let wishlist = sqlx::query_as::<_, Wishlist>(
            r"
            SELECT id, customer_id, sales_channel_id, title,
                   created_at, updated_at, deleted_at
            FROM wishlist
            WHERE customer_id = $1 AND sales_channel_id = $2 AND deleted_at IS NULL
            ORDER BY created_at ASC
            LIMIT 1
            ",
        )
        .bind(customer_id)
        .bind(sales_channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wishlist)
    }

    #[instrument(skip(self))]
    async fn get_wishlist(&self, id: &WishlistId) -> Result<Option<Wishlist>, RepositoryError> {
        let wishlist = sqlx::query_as::<_, Wishlist>(
            r"
            SELECT id, customer_id, sales_channel_id, title,
                   created_at, updated_at, deleted_at
            FROM wishlist
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wishlist)
    }

    #[instrument(skip(self))]
    async fn create_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
        title: Option<&str>,
    ) -> Result<Wishlist, RepositoryError> {
        sqlx::query_as::<_, Wishlist>(
            r"
            INSERT INTO wishlist (id, customer_id, sales_channel_id, title)
            VALUES ($1, $2, $3, $4)
            RETURNING id, customer_id, sales_channel_id, title,
                      created_at, updated_at, deleted_at
            ",
        )
        .bind(WishlistId::generate())
        .bind(customer_id)
        .bind(sales_channel_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "wishlist for this customer and sales channel"))
    }

    #[instrument(skip(self))]
    async fn soft_delete_wishlist(&self, id: &WishlistId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE wishlist
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn restore_wishlist(&self, id: &WishlistId) -> Result<Wishlist, RepositoryError> {
        sqlx::query_as::<_, Wishlist>(
            r"
            UPDATE wishlist
            SET updated_at = CASE WHEN deleted_at IS NULL THEN updated_at ELSE now() END,
                deleted_at = NULL
            WHERE id = $1
            RETURNING id, customer_id, sales_channel_id, title,
                      created_at, updated_at, deleted_at
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "wishlist for this customer and sales channel"))?
        .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self))]
    async fn find_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let item = sqlx::query_as::<_, WishlistItem>(
            r"
            SELECT id, wishlist_id, product_variant_id,
                   created_at, updated_at, deleted_at
            FROM wishlist_item
            WHERE wishlist_id = $1 AND product_variant_id = $2 AND deleted_at IS NULL
            ",
        )
        .bind(wishlist_id)
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    #[instrument(skip(self))]
    async fn get_item(&self, id: &WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError> {
        let item = sqlx::query_as::<_, WishlistItem>(
            r"
            SELECT id, wishlist_id, product_variant_id,
                   created_at, updated_at, deleted_at
            FROM wishlist_item
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    #[instrument(skip(self))]
    async fn upsert_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError> {
        let inserted = sqlx::query_as::<_, WishlistItem>(
            r"
            INSERT INTO wishlist_item (id, wishlist_id, product_variant_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (wishlist_id, product_variant_id) WHERE deleted_at IS NULL
            DO NOTHING
            RETURNING id, wishlist_id, product_variant_id,
                      created_at, updated_at, deleted_at
            ",
        )
        .bind(WishlistItemId::generate())
        .bind(wishlist_id)
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(item) = inserted {
            return Ok(item);
        }

        // The pair already had an active item
        self.find_item(wishlist_id, variant_id).await?.ok_or_else(|| {
            RepositoryError::Conflict("wishlist item changed concurrently".to_owned())
        })
    }

    #[instrument(skip(self))]
    async fn soft_delete_item(&self, id: &WishlistItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE wishlist_item
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn restore_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError> {
        if let Some(item) = self.find_item(wishlist_id, variant_id).await? {
            return Ok(item);
        }

        let restored = sqlx::query_as::<_, WishlistItem>(
            r"
            UPDATE wishlist_item
            SET deleted_at = NULL, updated_at = now()
            WHERE id = (
                SELECT id FROM wishlist_item
                WHERE wishlist_id = $1 AND product_variant_id = $2
                  AND deleted_at IS NOT NULL
                ORDER BY deleted_at DESC
                LIMIT 1
            )
            RETURNING id, wishlist_id, product_variant_id,
                      created_at, updated_at, deleted_at
            ",
        )
        .bind(wishlist_id)
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await;

        match restored {
            Ok(Some(item)) => Ok(item),
            Ok(None) => self.upsert_item(wishlist_id, variant_id).await,
            // Someone re-added the variant in the meantime
            Err(e) => match map_unique_violation(e, "wishlist item") {
                RepositoryError::Conflict(_) => self.upsert_item(wishlist_id, variant_id).await,
                other => Err(other),
            },
        }
    }

    #[instrument(skip(self))]
    async fn list_items(
        &self,
        wishlist_id: &WishlistId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let items = sqlx::query_as::<_, WishlistItem>(
            r"
            SELECT id, wishlist_id, product_variant_id,
                   created_at, updated_at, deleted_at
            FROM wishlist_item
            WHERE wishlist_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(wishlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    #[instrument(skip(self), fields(variants = variant_ids.len()))]
    async fn count_items_by_variant(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, u64>, RepositoryError> {
        if variant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = variant_ids.iter().map(ToString::to_string).collect();

        let rows: Vec<(VariantId, i64)> = sqlx::query_as(
            r"
            SELECT product_variant_id, COUNT(*)
            FROM wishlist_item
            WHERE deleted_at IS NULL AND product_variant_id = ANY($1)
            GROUP BY product_variant_id
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut counts: HashMap<VariantId, u64> =
            variant_ids.iter().map(|id| (id.clone(), 0)).collect();

        for (variant_id, count) in rows {
            let count = u64::try_from(count).map_err(|_| {
                RepositoryError::DataCorruption(format!("negative count for {variant_id}"))
            })?;
            if let Some(slot) = counts.get_mut(&variant_id) {
                *slot = count;
            }
        }

        Ok(counts)
    }
}
