//! Wishlist persistence.
//!
//! # Database
//!
//! The wishlist owns two tables:
//!
//! - `wishlist` - One active row per (customer, sales channel)
//! - `wishlist_item` - One active row per (wishlist, variant)
//!
//! Both use soft-delete (`deleted_at`); uniqueness is enforced by partial
//! unique indexes over the non-deleted rows.
//!
//! The catalog tables (`product`, `product_variant`) and the publishable key
//! mapping are owned by the commerce backend and only read here.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p wishlist-cli -- migrate
//! ```

pub mod memory;
pub mod wishlists;

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use wishlist_core::{
    CustomerId, SalesChannelId, VariantId, Wishlist, WishlistId, WishlistItem, WishlistItemId,
};

pub use memory::InMemoryWishlistStore;
pub use wishlists::PgWishlistStore;

/// Errors from wishlist persistence.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a second active wishlist for a scope).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Persistent storage for wishlists and their items.
///
/// Every lookup ignores soft-deleted rows unless stated otherwise.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Check the backing storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Find the active wishlist for a (customer, sales channel) scope.
    async fn find_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
    ) -> Result<Option<Wishlist>, RepositoryError>;

    /// Get an active wishlist by ID.
    async fn get_wishlist(&self, id: &WishlistId) -> Result<Option<Wishlist>, RepositoryError>;

    /// Create a wishlist.
    ///
    /// Fails with `Conflict` if the scope already has an active wishlist.
    async fn create_wishlist(
        &self,
        customer_id: &CustomerId,
        sales_channel_id: &SalesChannelId,
        title: Option<&str>,
    ) -> Result<Wishlist, RepositoryError>;

    /// Soft-delete an active wishlist. `NotFound` if there is none.
    async fn soft_delete_wishlist(&self, id: &WishlistId) -> Result<(), RepositoryError>;

    /// Undo a soft delete.
    ///
    /// `NotFound` if the ID never existed, `Conflict` if another active
    /// wishlist now occupies the scope.
    async fn restore_wishlist(&self, id: &WishlistId) -> Result<Wishlist, RepositoryError>;

    /// Find the active item for a (wishlist, variant) pair.
    async fn find_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<Option<WishlistItem>, RepositoryError>;

    /// Get an active item by ID.
    async fn get_item(&self, id: &WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError>;

    /// Return the active item for the pair, creating it if there is none.
    async fn upsert_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError>;

    /// Soft-delete an active item. `NotFound` if there is none.
    async fn soft_delete_item(&self, id: &WishlistItemId) -> Result<(), RepositoryError>;

    /// Bring back the item for a pair.
    ///
    /// Returns the active item if one exists, otherwise undeletes the most
    /// recently deleted one, otherwise inserts a new one.
    async fn restore_item(
        &self,
        wishlist_id: &WishlistId,
        variant_id: &VariantId,
    ) -> Result<WishlistItem, RepositoryError>;

    /// Active items of a wishlist, oldest first.
    async fn list_items(&self, wishlist_id: &WishlistId)
    -> Result<Vec<WishlistItem>, RepositoryError>;

    /// Number of active wishlist items per variant.
    ///
    /// Every requested variant is present in the result (0 when unused).
    /// An empty request returns an empty map without querying.
    async fn count_items_by_variant(
        &self,
        variant_ids: &BTreeSet<VariantId>,
    ) -> Result<HashMap<VariantId, u64>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map unique-index violations to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}
