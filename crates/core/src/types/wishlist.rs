//! Wishlist entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CustomerId, SalesChannelId, VariantId, WishlistId, WishlistItemId};

/// Title given to wishlists created implicitly on first add.
pub const DEFAULT_WISHLIST_TITLE: &str = "My Wishlist";

/// The (customer, sales channel) pair a wishlist belongs to.
///
/// At most one non-deleted wishlist exists per scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WishlistScope {
    pub customer_id: CustomerId,
    pub sales_channel_id: SalesChannelId,
}

impl WishlistScope {
    /// Create a new scope.
    #[must_use]
    pub const fn new(customer_id: CustomerId, sales_channel_id: SalesChannelId) -> Self {
        Self {
            customer_id,
            sales_channel_id,
        }
    }
}

/// A customer's saved collection of catalog variants within one sales channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Wishlist {
    /// Unique wishlist ID.
    pub id: WishlistId,
    /// Owning customer (immutable).
    pub customer_id: CustomerId,
    /// Sales channel the wishlist is scoped to (immutable).
    pub sales_channel_id: SalesChannelId,
    /// Optional display label.
    pub title: Option<String>,
    /// When the wishlist was created.
    pub created_at: DateTime<Utc>,
    /// When the wishlist was last modified.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Wishlist {
    /// The scope this wishlist occupies.
    #[must_use]
    pub fn scope(&self) -> WishlistScope {
        WishlistScope::new(self.customer_id.clone(), self.sales_channel_id.clone())
    }

    /// Whether the wishlist has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the wishlist belongs to the given customer.
    #[must_use]
    pub fn is_owned_by(&self, customer_id: &CustomerId) -> bool {
        &self.customer_id == customer_id
    }
}

/// A single (wishlist, variant) membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct WishlistItem {
    /// Unique item ID.
    pub id: WishlistItemId,
    /// Owning wishlist.
    pub wishlist_id: WishlistId,
    /// Referenced catalog variant.
    pub product_variant_id: VariantId,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last modified.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl WishlistItem {
    /// Whether the item has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
