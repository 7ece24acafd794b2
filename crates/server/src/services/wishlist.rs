//! Wishlist write operations and read model.
//!
//! # Writes
//!
//! - `add_item` - Idempotent; creates the scope's wishlist on first use
//! - `remove_item` - Soft-deletes an item owned by the caller
//! - `create_wishlist` - Idempotent; returns the existing wishlist if any
//!
//! Each write runs under the scope's lock and on a [`Saga`], so a failure
//! after a mutation undoes what this call already changed. Events reach the
//! [`Notifier`] only once the saga commits and never affect the result.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use wishlist_core::{
    CustomerId, DEFAULT_WISHLIST_TITLE, SalesChannelId, VariantId, Wishlist, WishlistEvent,
    WishlistItem, WishlistItemId, WishlistScope,
};

use crate::db::{RepositoryError, WishlistStore};
use crate::models::{VariantDetails, WishlistContents, WishlistItemDetails};
use crate::services::catalog::{Catalog, CatalogError};
use crate::services::events::Notifier;
use crate::services::locks::ScopeLocks;
use crate::services::saga::Saga;

/// Client-facing message for any item a caller cannot remove.
pub const ITEM_NOT_FOUND: &str = "Wishlist item not found";

/// Errors from wishlist operations.
///
/// Messages are client-facing.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// The caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// The request is malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown variant, unknown item, or an item owned by someone else.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness race that could not be resolved.
    #[error("{0}")]
    Conflict(String),

    /// A collaborator failed.
    #[error("failed to {action}: {cause}")]
    Unexpected { action: &'static str, cause: String },
}

impl WishlistError {
    /// Machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidInput(_) => "invalid_data",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unexpected { .. } => "unexpected_state",
        }
    }

    /// Wrap a collaborator error as `Unexpected`.
    fn unexpected<E: Display>(action: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::Unexpected {
            action,
            cause: e.to_string(),
        }
    }

    fn variant_not_found(variant_id: &VariantId) -> Self {
        Self::NotFound(format!("Product variant with id {variant_id} not found"))
    }

    /// Missing, removed and foreign items share one message so callers
    /// cannot discover other customers' item IDs.
    pub(crate) fn item_not_found() -> Self {
        Self::NotFound(ITEM_NOT_FOUND.to_owned())
    }
}

/// Wishlist operations over an injected store, catalog and notifier.
#[derive(Clone)]
pub struct WishlistService {
    store: Arc<dyn WishlistStore>,
    catalog: Arc<dyn Catalog>,
    notifier: Notifier,
    locks: Arc<ScopeLocks>,
}

impl WishlistService {
    /// Create a new wishlist service.
    #[must_use]
    pub fn new(store: Arc<dyn WishlistStore>, catalog: Arc<dyn Catalog>, notifier: Notifier) -> Self {
        Self {
            store,
            catalog,
            notifier,
            locks: Arc::new(ScopeLocks::new()),
        }
    }

    /// Get a reference to the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn WishlistStore> {
        &self.store
    }

    /// Add a variant to the customer's wishlist for a sales channel.
    ///
    /// Creates the wishlist on first use. Adding a variant that is already
    /// on the wishlist changes nothing and emits no event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown variant and `Unexpected` if the
    /// store or catalog fails (after undoing this call's writes).
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        variant_id: &VariantId,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
    ) -> Result<Wishlist, WishlistError> {
        let exists = self
            .catalog
            .variant_exists(variant_id)
            .await
            .map_err(WishlistError::unexpected("validate product variant"))?;
        if !exists {
            return Err(WishlistError::variant_not_found(variant_id));
        }

        let scope = WishlistScope::new(customer_id.clone(), sales_channel_id.clone());
        let _guard = self.locks.lock(&scope).await;

        let mut saga = Saga::new("add_wishlist_item");
        let mut events = Vec::new();
        let result = self
            .add_item_steps(&mut saga, &mut events, &scope, variant_id)
            .await;
        let wishlist = saga.finish(result).await?;

        self.publish(events);
        Ok(wishlist)
    }

    async fn add_item_steps(
        &self,
        saga: &mut Saga,
        events: &mut Vec<WishlistEvent>,
        scope: &WishlistScope,
        variant_id: &VariantId,
    ) -> Result<Wishlist, WishlistError> {
        let wishlist = self.ensure_wishlist(saga, events, scope, None).await?;

        let existing = self
            .store
            .find_item(&wishlist.id, variant_id)
            .await
            .map_err(WishlistError::unexpected("look up wishlist item"))?;
        if let Some(item) = existing {
            debug!(wishlist_id = %wishlist.id, item_id = %item.id, "Variant already on wishlist");
            return Ok(wishlist);
        }

        let item = self
            .store
            .upsert_item(&wishlist.id, variant_id)
            .await
            .map_err(WishlistError::unexpected("create wishlist item"))?;

        let store = Arc::clone(&self.store);
        let item_id = item.id.clone();
        saga.on_rollback("delete_wishlist_item", move || async move {
            store.soft_delete_item(&item_id).await
        });

        info!(wishlist_id = %wishlist.id, item_id = %item.id, "Wishlist item added");
        events.push(WishlistEvent::item_added(&wishlist, &item));

        Ok(wishlist)
    }

    /// Remove an item from the caller's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item does not exist (or was already
    /// removed) or belongs to another customer.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        item_id: &WishlistItemId,
        customer_id: &CustomerId,
    ) -> Result<Wishlist, WishlistError> {
        let item = self
            .store
            .get_item(item_id)
            .await
            .map_err(WishlistError::unexpected("look up wishlist item"))?
            .ok_or_else(WishlistError::item_not_found)?;

        let wishlist = self
            .store
            .get_wishlist(&item.wishlist_id)
            .await
            .map_err(WishlistError::unexpected("look up wishlist"))?
            .filter(|w| w.is_owned_by(customer_id))
            .ok_or_else(WishlistError::item_not_found)?;

        let _guard = self.locks.lock(&wishlist.scope()).await;

        let mut saga = Saga::new("delete_wishlist_item");
        let mut events = Vec::new();
        let result = self
            .remove_item_steps(&mut saga, &mut events, wishlist, &item)
            .await;
        let wishlist = saga.finish(result).await?;

        self.publish(events);
        Ok(wishlist)
    }

    async fn remove_item_steps(
        &self,
        saga: &mut Saga,
        events: &mut Vec<WishlistEvent>,
        wishlist: Wishlist,
        item: &WishlistItem,
    ) -> Result<Wishlist, WishlistError> {
        match self.store.soft_delete_item(&item.id).await {
            Ok(()) => {}
            // Removed by a concurrent request
            Err(RepositoryError::NotFound) => return Err(WishlistError::item_not_found()),
            Err(e) => return Err(WishlistError::unexpected("delete wishlist item")(e)),
        }

        let store = Arc::clone(&self.store);
        let wishlist_id = item.wishlist_id.clone();
        let variant_id = item.product_variant_id.clone();
        saga.on_rollback("restore_wishlist_item", move || async move {
            store.restore_item(&wishlist_id, &variant_id).await.map(|_| ())
        });

        info!(wishlist_id = %wishlist.id, item_id = %item.id, "Wishlist item removed");
        events.push(WishlistEvent::item_removed(&wishlist, item));

        Ok(wishlist)
    }

    /// Return the scope's wishlist, creating it if there is none.
    ///
    /// A blank or missing title becomes "My Wishlist".
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if creation raced with another writer and the
    /// winner could not be read back, `Unexpected` on store failures.
    #[instrument(skip(self))]
    pub async fn create_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
        title: Option<&str>,
    ) -> Result<Wishlist, WishlistError> {
        let scope = WishlistScope::new(customer_id.clone(), sales_channel_id.clone());
        let _guard = self.locks.lock(&scope).await;

        let mut saga = Saga::new("create_wishlist");
        let mut events = Vec::new();
        let result = self
            .ensure_wishlist(&mut saga, &mut events, &scope, title)
            .await;
        let wishlist = saga.finish(result).await?;

        self.publish(events);
        Ok(wishlist)
    }

    /// Find or create the wishlist for `scope`. Caller holds the scope lock.
    ///
    /// The `wishlist.created` event is only collected here; callers publish
    /// it once their saga has committed, so a rolled-back wishlist is never
    /// announced.
    async fn ensure_wishlist(
        &self,
        saga: &mut Saga,
        events: &mut Vec<WishlistEvent>,
        scope: &WishlistScope,
        title: Option<&str>,
    ) -> Result<Wishlist, WishlistError> {
        if let Some(wishlist) = self.find_wishlist(scope).await? {
            return Ok(wishlist);
        }

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_WISHLIST_TITLE);

        let wishlist = match self
            .store
            .create_wishlist(&scope.customer_id, &scope.sales_channel_id, Some(title))
            .await
        {
            Ok(wishlist) => wishlist,
            Err(RepositoryError::Conflict(reason)) => {
                // Another process won the unique index
                warn!(customer_id = %scope.customer_id, %reason, "Wishlist created concurrently");
                return self.find_wishlist(scope).await?.ok_or_else(|| {
                    WishlistError::Conflict(
                        "Wishlist for this customer and sales channel changed concurrently"
                            .to_owned(),
                    )
                });
            }
            Err(e) => return Err(WishlistError::unexpected("create wishlist")(e)),
        };

        let store = Arc::clone(&self.store);
        let wishlist_id = wishlist.id.clone();
        saga.on_rollback("delete_wishlist", move || async move {
            store.soft_delete_wishlist(&wishlist_id).await
        });

        info!(wishlist_id = %wishlist.id, customer_id = %wishlist.customer_id, "Wishlist created");
        events.push(WishlistEvent::created(&wishlist));

        Ok(wishlist)
    }

    /// Hand committed events to the notifier, in order.
    fn publish(&self, events: Vec<WishlistEvent>) {
        for event in events {
            self.notifier.notify(event);
        }
    }

    async fn find_wishlist(&self, scope: &WishlistScope) -> Result<Option<Wishlist>, WishlistError> {
        self.store
            .find_wishlist(&scope.customer_id, &scope.sales_channel_id)
            .await
            .map_err(WishlistError::unexpected("look up wishlist"))
    }

    /// The customer's wishlist for a sales channel, with catalog details.
    ///
    /// Returns empty contents when no wishlist exists. Items whose variant
    /// cannot be resolved are still listed, with `product_variant: null`.
    ///
    /// # Errors
    ///
    /// Returns `Unexpected` if the store fails.
    #[instrument(skip(self))]
    pub async fn get_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
    ) -> Result<WishlistContents, WishlistError> {
        let scope = WishlistScope::new(customer_id.clone(), sales_channel_id.clone());
        let Some(wishlist) = self
            .find_wishlist(&scope)
            .await
            .map_err(|e| rename_action(e, "fetch wishlist"))?
        else {
            return Ok(WishlistContents::default());
        };

        let items = self
            .store
            .list_items(&wishlist.id)
            .await
            .map_err(WishlistError::unexpected("fetch wishlist"))?;

        let items = join_all(items.into_iter().map(|item| self.enrich(item))).await;

        Ok(WishlistContents {
            wishlist: Some(wishlist),
            items,
        })
    }

    async fn enrich(&self, item: WishlistItem) -> WishlistItemDetails {
        let product_variant = match self.variant_details(&item.product_variant_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(
                    variant_id = %item.product_variant_id,
                    error = %e,
                    "Error fetching product variant"
                );
                None
            }
        };

        WishlistItemDetails {
            item,
            product_variant,
        }
    }

    async fn variant_details(
        &self,
        variant_id: &VariantId,
    ) -> Result<Option<VariantDetails>, CatalogError> {
        let Some(variant) = self.catalog.get_variant(variant_id).await? else {
            return Ok(None);
        };
        let product = self.catalog.get_product(&variant.product_id).await?;

        Ok(Some(VariantDetails { variant, product }))
    }

    /// Number of active wishlist items per variant.
    ///
    /// Every requested variant appears in the result.
    ///
    /// # Errors
    ///
    /// Returns `Unexpected` if the store fails.
    #[instrument(skip(self), fields(variants = variant_ids.len()))]
    pub async fn count_items_by_variant(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, u64>, WishlistError> {
        if variant_ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.store
            .count_items_by_variant(variant_ids)
            .await
            .map_err(WishlistError::unexpected("count wishlist items"))
    }
}

fn rename_action(err: WishlistError, action: &'static str) -> WishlistError {
    match err {
        WishlistError::Unexpected { cause, .. } => WishlistError::Unexpected { action, cause },
        other => other,
    }
}
