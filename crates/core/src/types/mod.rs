//! Core types for the wishlist module.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod event;
pub mod id;
pub mod status;
pub mod wishlist;

pub use catalog::{CatalogProduct, CatalogVariant};
pub use event::{WishlistCreated, WishlistEvent, WishlistItemChanged};
pub use id::*;
pub use status::ProductStatus;
pub use wishlist::{DEFAULT_WISHLIST_TITLE, Wishlist, WishlistItem, WishlistScope};
