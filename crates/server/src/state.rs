//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::{SalesChannelResolver, WishlistService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and holds the wishlist
/// service, the sales channel resolver and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    wishlists: WishlistService,
    channels: Arc<dyn SalesChannelResolver>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `wishlists` - Wishlist service with its store, catalog and notifier
    /// * `channels` - Publishable key resolver
    #[must_use]
    pub fn new(
        config: ServerConfig,
        wishlists: WishlistService,
        channels: Arc<dyn SalesChannelResolver>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                wishlists,
                channels,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the wishlist service.
    #[must_use]
    pub fn wishlists(&self) -> &WishlistService {
        &self.inner.wishlists
    }

    /// Get a reference to the sales channel resolver.
    #[must_use]
    pub fn channels(&self) -> &dyn SalesChannelResolver {
        self.inner.channels.as_ref()
    }
}
