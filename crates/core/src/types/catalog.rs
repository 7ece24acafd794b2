//! Catalog summaries used to enrich wishlist items.
//!
//! The catalog is owned by another system; these are the read-only
//! projections the wishlist needs.

use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};
use super::status::ProductStatus;

/// A purchasable variant of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct CatalogVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: Option<String>,
    pub title: String,
}

/// The parent product of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub handle: String,
    pub thumbnail: Option<String>,
    pub status: ProductStatus,
}
