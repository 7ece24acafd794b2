//! CLI command implementations.

pub mod counts;
pub mod migrate;

use thiserror::Error;

use wishlist_server::config::{ConfigError, database_url_from_env};
use wishlist_server::db::create_pool;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("session store error: {0}")]
    SessionStore(String),

    #[error("store error: {0}")]
    Store(#[from] wishlist_server::db::RepositoryError),

    #[error("invalid variant id {0:?}: {1}")]
    InvalidVariant(String, wishlist_core::IdError),
}

/// Connect to the wishlist database from environment configuration.
async fn connect() -> Result<sqlx::PgPool, CommandError> {
    let database_url = database_url_from_env()?;
    tracing::info!("Connecting to wishlist database...");
    Ok(create_pool(&database_url).await?)
}
