//! Wishlist read model and HTTP payloads.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use wishlist_core::{CatalogProduct, CatalogVariant, VariantId, Wishlist, WishlistItem};

/// A variant with its parent product, as shown on a wishlist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantDetails {
    #[serde(flatten)]
    pub variant: CatalogVariant,
    /// `None` when the product no longer exists.
    pub product: Option<CatalogProduct>,
}

/// A wishlist item enriched with catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WishlistItemDetails {
    #[serde(flatten)]
    pub item: WishlistItem,
    /// `None` when the variant is gone or could not be looked up.
    pub product_variant: Option<VariantDetails>,
}

/// A customer's wishlist with enriched items.
///
/// Both fields are empty when the customer has no wishlist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WishlistContents {
    pub wishlist: Option<Wishlist>,
    pub items: Vec<WishlistItemDetails>,
}

/// Body of `POST /store/wishlist`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddItemRequest {
    pub variant_id: Option<String>,
}

/// Response of the write endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistResponse {
    pub wishlist: Wishlist,
}

/// Query of `GET /store/wishlist/variant-counts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantCountsQuery {
    /// Comma-separated variant IDs.
    pub variant_ids: Option<String>,
}

/// Response of `GET /store/wishlist/variant-counts`.
#[derive(Debug, Clone, Serialize)]
pub struct VariantCountsResponse {
    pub counts: BTreeMap<VariantId, u64>,
}

impl From<HashMap<VariantId, u64>> for VariantCountsResponse {
    fn from(counts: HashMap<VariantId, u64>) -> Self {
        Self {
            counts: counts.into_iter().collect(),
        }
    }
}
