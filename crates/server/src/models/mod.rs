//! Domain models for the wishlist server.

pub mod session;
pub mod wishlist;

pub use session::{CurrentCustomer, keys as session_keys};
pub use wishlist::{
    AddItemRequest, VariantCountsQuery, VariantCountsResponse, VariantDetails, WishlistContents,
    WishlistItemDetails, WishlistResponse,
};
