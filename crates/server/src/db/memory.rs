//! In-memory wishlist store for tests and database-less local runs.
//!
//! Enforces the same uniqueness rules as the partial unique indexes in the
//! `PostgreSQL` schema.

#![allow(clippy::significant_drop_tightening)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use wishlist_core::{
    CustomerId, SalesChannelId, VariantId, Wishlist, WishlistId, WishlistItem, WishlistItemId,
};

use super::{RepositoryError, WishlistStore};

#[derive(Default)]
struct Tables {
    wishlists: Vec<Wishlist>,
    items: Vec<WishlistItem>,
}

/// Thread-safe in-memory wishlist store.
///
/// Rows are kept in insertion order; soft-deleted rows are retained.
#[derive(Clone, Default)]
pub struct InMemoryWishlistStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryWishlistStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All wishlist rows, including soft-deleted ones.
    #[must_use]
    pub fn all_wishlists(&self) -> Vec<Wishlist> {
        self.read().map(|t| t.wishlists.clone()).unwrap_or_default()
    }

    /// All item rows, including soft-deleted ones.
    #[must_use]
    pub fn all_items(&self) -> Vec<WishlistItem> {
        self.read().map(|t| t.items.clone()).unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        self.tables
            .read()
            .map_err(|_| RepositoryError::DataCorruption("store lock poisoned".to_owned()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        self.tables
            .write()
            .map_err(|_| RepositoryError::DataCorruption("store lock poisoned".to_owned()))
    }
}

impl Tables {
    fn active_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
    ) -> Option<&Wishlist> {
        self.wishlists.iter().find(|w| {
            !w.is_deleted() && &w.customer_id == customer_id && &w.sales_channel_id == sales_channel_id
        })
    }

    fn active_item(&self, wishlist_id: &WishlistId, variant_id: &VariantId) -> Option<&WishlistItem> {
        self.items.iter().find(|i| {
            !i.is_deleted() && &i.wishlist_id == wishlist_id && &i.product_variant_id == variant_id
        })
    }

    fn insert_item(&mut self, wishlist_id: &WishlistId, variant_id: &VariantId) -> WishlistItem {
        let now = Utc::now();
        let item = WishlistItem {
            id: WishlistItemId::generate(),
            wishlist_id: wishlist_id.clone(),
            product_variant_id: variant_id.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.items.push(item.clone());
        item
    }
}

#[async_trait]
impl WishlistStore for InMemoryWishlistStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.read().map(|_| ())
    }

    async fn find_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
    ) -> Result<Option<Wishlist>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables.active_wishlist(customer_id, sales_channel_id).cloned())
    }

    async fn get_wishlist(&self, id: &WishlistId) -> Result<Option<Wishlist>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .wishlists
            .iter()
            .find(|w| &w.id == id && !w.is_deleted())
            .cloned())
    }

    async fn create_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
        title: Option<&str>,
    ) -> Result<Wishlist, RepositoryError> {
        let mut tables = self.write()?;

        if tables.active_wishlist(customer_id, sales_channel_id).is_some() {
            return Err(RepositoryError::Conflict(
                "wishlist for this customer and sales channel already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let wishlist = Wishlist {
            id: WishlistId::generate(),
            customer_id: customer_id.clone(),
            sales_channel_id: sales_channel_id.clone(),
            title: title.map(str::to_owned),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.wishlists.push(wishlist.clone());

        Ok(wishlist)
    }

    async fn soft_delete_wishlist(&self, id: &WishlistId) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        let wishlist = tables
            .wishlists
            .iter_mut()
            .find(|w| &w.id == id && !w.is_deleted())
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        wishlist.deleted_at = Some(now);
        wishlist.updated_at = now;
        Ok(())
    }

    async fn restore_wishlist(&self, id: &WishlistId) -> Result<Wishlist, RepositoryError> {
        let mut tables = self.write()?;

        let target = tables
            .wishlists
            .iter()
            .find(|w| &w.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        if !target.is_deleted() {
            return Ok(target);
        }

        if tables
            .active_wishlist(&target.customer_id, &target.sales_channel_id)
            .is_some()
        {
            return Err(RepositoryError::Conflict(
                "wishlist for this customer and sales channel already exists".to_owned(),
            ));
        }

        let wishlist = tables
            .wishlists
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or(RepositoryError::NotFound)?;
        wishlist.deleted_at = None;
        wishlist.updated_at = Utc::now();
        Ok(wishlist.clone())
    }

    async fn find_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables.active_item(wishlist_id, variant_id).cloned())
    }

    async fn get_item(&self, id: &WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .items
            .iter()
            .find(|i| &i.id == id && !i.is_deleted())
            .cloned())
    }

    async fn upsert_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError> {
        let mut tables = self.write()?;

        if let Some(existing) = tables.active_item(wishlist_id, variant_id) {
            return Ok(existing.clone());
        }

        Ok(tables.insert_item(wishlist_id, variant_id))
    }

    async fn soft_delete_item(&self, id: &WishlistItemId) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        let item = tables
            .items
            .iter_mut()
            .find(|i| &i.id == id && !i.is_deleted())
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        item.deleted_at = Some(now);
        item.updated_at = now;
        Ok(())
    }

    async fn restore_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError> {
        let mut tables = self.write()?;

        if let Some(existing) = tables.active_item(wishlist_id, variant_id) {
            return Ok(existing.clone());
        }

        let latest_deleted = tables
            .items
            .iter_mut()
            .filter(|i| &i.wishlist_id == wishlist_id && &i.product_variant_id == variant_id)
            .max_by_key(|i| i.deleted_at);

        if let Some(item) = latest_deleted {
            item.deleted_at = None;
            item.updated_at = Utc::now();
            return Ok(item.clone());
        }

        Ok(tables.insert_item(wishlist_id, variant_id))
    }

    async fn list_items(
        &self,
        wishlist_id: &WishlistId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let tables = self.read()?;
        let mut items: Vec<WishlistItem> = tables
            .items
            .iter()
            .filter(|i| &i.wishlist_id == wishlist_id && !i.is_deleted())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn count_items_by_variant(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, u64>, RepositoryError> {
        if variant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let tables = self.read()?;
        let mut counts: HashMap<VariantId, u64> =
            variant_ids.iter().map(|id| (id.clone(), 0)).collect();

        for item in tables.items.iter().filter(|i| !i.is_deleted()) {
            if let Some(count) = counts.get_mut(&item.product_variant_id) {
                *count += 1;
            }
        }

        Ok(counts)
    }
}
