//! Notifications published when wishlists change.
//!
//! On the wire every event is an envelope `{"name": ..., "data": {...}}`,
//! which is exactly the adjacently tagged serde form of [`WishlistEvent`].

use serde::{Deserialize, Serialize};

use super::id::{CustomerId, SalesChannelId, VariantId, WishlistId, WishlistItemId};
use super::wishlist::{Wishlist, WishlistItem};

/// Payload of `wishlist.created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistCreated {
    pub id: WishlistId,
    pub customer_id: CustomerId,
    pub sales_channel_id: SalesChannelId,
    pub title: Option<String>,
}

/// Payload of `wishlist.item_added` and `wishlist.item_removed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItemChanged {
    pub id: WishlistItemId,
    pub wishlist_id: WishlistId,
    pub customer_id: CustomerId,
    pub product_variant_id: VariantId,
    pub sales_channel_id: SalesChannelId,
}

impl WishlistItemChanged {
    fn new(wishlist: &Wishlist, item: &WishlistItem) -> Self {
        Self {
            id: item.id.clone(),
            wishlist_id: wishlist.id.clone(),
            customer_id: wishlist.customer_id.clone(),
            product_variant_id: item.product_variant_id.clone(),
            sales_channel_id: wishlist.sales_channel_id.clone(),
        }
    }
}

/// A wishlist notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum WishlistEvent {
    #[serde(rename = "wishlist.created")]
    Created(WishlistCreated),
    #[serde(rename = "wishlist.item_added")]
    ItemAdded(WishlistItemChanged),
    #[serde(rename = "wishlist.item_removed")]
    ItemRemoved(WishlistItemChanged),
}

impl WishlistEvent {
    pub const CREATED: &'static str = "wishlist.created";
    pub const ITEM_ADDED: &'static str = "wishlist.item_added";
    pub const ITEM_REMOVED: &'static str = "wishlist.item_removed";

    /// Event for a newly created wishlist.
    #[must_use]
    pub fn created(wishlist: &Wishlist) -> Self {
        Self::Created(WishlistCreated {
            id: wishlist.id.clone(),
            customer_id: wishlist.customer_id.clone(),
            sales_channel_id: wishlist.sales_channel_id.clone(),
            title: wishlist.title.clone(),
        })
    }

    /// Event for an item added to `wishlist`.
    #[must_use]
    pub fn item_added(wishlist: &Wishlist, item: &WishlistItem) -> Self {
        Self::ItemAdded(WishlistItemChanged::new(wishlist, item))
    }

    /// Event for an item removed from `wishlist`.
    #[must_use]
    pub fn item_removed(wishlist: &Wishlist, item: &WishlistItem) -> Self {
        Self::ItemRemoved(WishlistItemChanged::new(wishlist, item))
    }

    /// The event name, e.g. `wishlist.item_added`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Created(_) => Self::CREATED,
            Self::ItemAdded(_) => Self::ITEM_ADDED,
            Self::ItemRemoved(_) => Self::ITEM_REMOVED,
        }
    }

    /// The wishlist this event concerns.
    #[must_use]
    pub const fn wishlist_id(&self) -> &WishlistId {
        match self {
            Self::Created(payload) => &payload.id,
            Self::ItemAdded(payload) | Self::ItemRemoved(payload) => &payload.wishlist_id,
        }
    }

    /// Serialize into the wire envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_envelope(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn fixtures() -> (Wishlist, WishlistItem) {
        let now = Utc::now();
        let wishlist = Wishlist {
            id: WishlistId::parse("wl_1").unwrap(),
            customer_id: CustomerId::parse("cus_1").unwrap(),
            sales_channel_id: SalesChannelId::parse("sc_1").unwrap(),
            title: Some("My Wishlist".to_owned()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let item = WishlistItem {
            id: WishlistItemId::parse("wli_1").unwrap(),
            wishlist_id: wishlist.id.clone(),
            product_variant_id: VariantId::parse("variant_1").unwrap(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        (wishlist, item)
    }

    #[test]
    fn test_created_envelope() {
        let (wishlist, _) = fixtures();
        let envelope = WishlistEvent::created(&wishlist).to_envelope().unwrap();

        assert_eq!(
            envelope,
            serde_json::json!({
                "name": "wishlist.created",
                "data": {
                    "id": "wl_1",
                    "customer_id": "cus_1",
                    "sales_channel_id": "sc_1",
                    "title": "My Wishlist",
                }
            })
        );
    }

    #[test]
    fn test_item_events_carry_scope() {
        let (wishlist, item) = fixtures();
        let event = WishlistEvent::item_removed(&wishlist, &item);
        let envelope = event.to_envelope().unwrap();

        assert_eq!(event.name(), "wishlist.item_removed");
        assert_eq!(event.wishlist_id().as_str(), "wl_1");
        assert_eq!(envelope["data"]["id"], "wli_1");
        assert_eq!(envelope["data"]["customer_id"], "cus_1");
        assert_eq!(envelope["data"]["product_variant_id"], "variant_1");
        assert_eq!(envelope["data"]["sales_channel_id"], "sc_1");
    }

    #[test]
    fn test_names() {
        let (wishlist, item) = fixtures();
        assert_eq!(WishlistEvent::created(&wishlist).name(), "wishlist.created");
        assert_eq!(
            WishlistEvent::item_added(&wishlist, &item).name(),
            "wishlist.item_added"
        );
    }
}
