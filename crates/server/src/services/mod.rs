//! Business logic services for the wishlist server.
//!
//! # Services
//!
//! - `wishlist` - Add/remove items, lazy wishlist creation, read model
//! - `catalog` - Product and variant lookups (Postgres, cached, in-memory)
//! - `channels` - Publishable API key to sales channel resolution
//! - `events` - Best-effort event notifier and its transports
//! - `saga` - Ordered compensation for multi-step writes
//! - `locks` - Per-scope async mutual exclusion

pub mod catalog;
pub mod channels;
pub mod events;
pub mod locks;
pub mod saga;
pub mod wishlist;

pub use catalog::{CachedCatalog, Catalog, CatalogError, InMemoryCatalog, PgCatalog};
pub use channels::{
    PgSalesChannelResolver, ResolverError, SalesChannelResolver, StaticSalesChannelResolver,
};
pub use events::{
    EventTransport, LogTransport, Notifier, PgNotifyTransport, TransportError, WebhookTransport,
};
pub use locks::ScopeLocks;
pub use saga::Saga;
pub use wishlist::{ITEM_NOT_FOUND, WishlistError, WishlistService};
