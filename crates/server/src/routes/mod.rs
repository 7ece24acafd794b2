//! HTTP route handlers for the wishlist server.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                      - Liveness
//! GET    /health/ready                                - Readiness (store ping)
//!
//! # Store API (customer session + x-publishable-api-key)
//! GET    /store/wishlist                              - Wishlist with items
//! POST   /store/wishlist                              - Add a variant
//! DELETE /store/wishlist/{item_id}                    - Remove an item
//! DELETE /store/customers/me/wishlists/items/{item_id} - Remove an item (alias)
//!
//! # Public
//! GET    /store/wishlist/variant-counts?variant_ids=  - Wishlist counts per variant
//! ```

pub mod health;
pub mod wishlist;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create the health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create the store API routes.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/store/wishlist",
            get(wishlist::get_wishlist).post(wishlist::add_item),
        )
        .route(
            "/store/wishlist/variant-counts",
            get(wishlist::variant_counts),
        )
        .route("/store/wishlist/{item_id}", delete(wishlist::remove_item))
        .route(
            "/store/customers/me/wishlists/items/{item_id}",
            delete(wishlist::remove_item),
        )
}

/// All routes without rate limiting.
pub fn routes() -> Router<AppState> {
    health_routes().merge(store_routes())
}

/// Wrap `routes` in the shared middleware stack and attach state.
///
/// Sentry layers are added by the binary.
pub fn app<S>(
    routes: Router<AppState>,
    state: AppState,
    session_layer: SessionManagerLayer<S>,
) -> Router
where
    S: SessionStore + Clone,
{
    routes
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            },
        ))
        .with_state(state)
}
