//! HTTP middleware stack for the wishlist server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, shared with the storefront)
//! 5. Security headers
//! 6. Rate limiting (governor, store routes only)
//!
//! Extractors `RequireCustomer` and `RequireSalesChannel` resolve the caller
//! and the sales channel per request.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod sales_channel;
pub mod security_headers;
pub mod session;

pub use auth::{RequireCustomer, set_current_customer};
pub use rate_limit::api_rate_limiter;
pub use request_id::request_id_middleware;
pub use sales_channel::{PUBLISHABLE_KEY_HEADER, RequireSalesChannel};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
