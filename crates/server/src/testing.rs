//! Test doubles for the wishlist service.
//!
//! Compiled for this crate's tests and, through the `testing` feature, for
//! the integration tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use wishlist_core::{
    CustomerId, SalesChannelId, VariantId, Wishlist, WishlistEvent, WishlistId, WishlistItem,
    WishlistItemId,
};

use crate::db::{InMemoryWishlistStore, RepositoryError, WishlistStore};
use crate::services::{EventTransport, TransportError};

// =============================================================================
// Transports
// =============================================================================

/// Transport that keeps every published event.
#[derive(Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<WishlistEvent>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn events(&self) -> Vec<WishlistEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the events received so far.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(WishlistEvent::name).collect()
    }

    /// Wait until at least `count` events arrived (or five seconds passed).
    pub async fn wait_for(&self, count: usize) -> Vec<WishlistEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let events = self.events();
            if events.len() >= count || Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl EventTransport for RecordingTransport {
    async fn publish(&self, event: &WishlistEvent) -> Result<(), TransportError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Transport whose endpoint is always down.
pub struct FailingTransport;

#[async_trait]
impl EventTransport for FailingTransport {
    async fn publish(&self, _event: &WishlistEvent) -> Result<(), TransportError> {
        Err(TransportError::Rejected {
            status: 503,
            message: "event bus unavailable".to_owned(),
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// In-memory store with switchable failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryWishlistStore,
    fail_upsert: AtomicBool,
    fail_counts: AtomicBool,
}

impl FlakyStore {
    /// Make `upsert_item` fail (or succeed again).
    pub fn fail_item_writes(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    /// Make `count_items_by_variant` fail.
    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl WishlistStore for FlakyStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.inner.ping().await
    }

    async fn find_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
    ) -> Result<Option<Wishlist>, RepositoryError> {
        self.inner.find_wishlist(customer_id, sales_channel_id).await
    }

    async fn get_wishlist(&self, id: &WishlistId) -> Result<Option<Wishlist>, RepositoryError> {
        self.inner.get_wishlist(id).await
    }

    async fn create_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
        title: Option<&str>,
    ) -> Result<Wishlist, RepositoryError> {
        self.inner
            .create_wishlist(customer_id, sales_channel_id, title)
            .await
    }

    async fn soft_delete_wishlist(&self, id: &WishlistId) -> Result<(), RepositoryError> {
        self.inner.soft_delete_wishlist(id).await
    }

    async fn restore_wishlist(&self, id: &WishlistId) -> Result<Wishlist, RepositoryError> {
        self.inner.restore_wishlist(id).await
    }

    async fn find_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        self.inner.find_item(wishlist_id, variant_id).await
    }

    async fn get_item(&self, id: &WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError> {
        self.inner.get_item(id).await
    }

    async fn upsert_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(RepositoryError::DataCorruption(
                "item table unavailable".to_owned(),
            ));
        }
        self.inner.upsert_item(wishlist_id, variant_id).await
    }

    async fn soft_delete_item(&self, id: &WishlistItemId) -> Result<(), RepositoryError> {
        self.inner.soft_delete_item(id).await
    }

    async fn restore_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError> {
        self.inner.restore_item(wishlist_id, variant_id).await
    }

    async fn list_items(
        &self,
        wishlist_id: &WishlistId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        self.inner.list_items(wishlist_id).await
    }

    async fn count_items_by_variant(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, u64>, RepositoryError> {
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(RepositoryError::DataCorruption(
                "count query unavailable".to_owned(),
            ));
        }
        self.inner.count_items_by_variant(variant_ids).await
    }
}
