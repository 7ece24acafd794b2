//! Integration test harness for the wishlist server.
//!
//! Builds the real router and service over in-memory stores, so the tests
//! need no database or running server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wishlist-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `wishlist_api` - HTTP status mapping, auth and routes
//! - `wishlist_service` - Idempotency, compensation, events and concurrency

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{HeaderMap, Request, StatusCode, header},
    routing::post,
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use wishlist_core::{
    CatalogProduct, CatalogVariant, CustomerId, ProductId, ProductStatus, SalesChannelId,
    VariantId,
};
use wishlist_server::config::{CatalogConfig, EventsConfig, ServerConfig};
use wishlist_server::middleware::{PUBLISHABLE_KEY_HEADER, create_session_layer, set_current_customer};
use wishlist_server::models::CurrentCustomer;
use wishlist_server::routes;
use wishlist_server::services::{
    EventTransport, InMemoryCatalog, Notifier, StaticSalesChannelResolver, WishlistService,
};
use wishlist_server::state::AppState;

pub use wishlist_server::testing::{FailingTransport, FlakyStore, RecordingTransport};

/// Publishable key mapped to [`SALES_CHANNEL`].
pub const PUBLISHABLE_KEY: &str = "pk_test_storefront";
/// Publishable key with no sales channels.
pub const EMPTY_PUBLISHABLE_KEY: &str = "pk_test_empty";
/// Sales channel every test wishlist lives in.
pub const SALES_CHANNEL: &str = "sc_default";
/// Variants present in the test catalog.
pub const VARIANTS: [&str; 3] = ["variant_red", "variant_blue", "variant_green"];

// =============================================================================
// Test Context
// =============================================================================

/// Fully wired service and router over in-memory dependencies.
pub struct TestContext {
    pub store: Arc<FlakyStore>,
    pub catalog: InMemoryCatalog,
    pub events: Arc<RecordingTransport>,
    pub service: WishlistService,
    pub router: Router,
}

/// Response status, headers and JSON body (`Null` for empty or non-JSON).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestContext {
    /// Context whose events are recorded.
    pub fn new() -> Self {
        let events = Arc::new(RecordingTransport::default());
        Self::build(events.clone(), events)
    }

    /// Context whose event transport always fails.
    pub fn with_failing_events() -> Self {
        Self::build(
            Arc::new(FailingTransport),
            Arc::new(RecordingTransport::default()),
        )
    }

    fn build(transport: Arc<dyn EventTransport>, events: Arc<RecordingTransport>) -> Self {
        let store = Arc::new(FlakyStore::default());
        let catalog = seeded_catalog();
        let (notifier, _worker) = Notifier::spawn(transport, 64);
        let service = WishlistService::new(store.clone(), Arc::new(catalog.clone()), notifier);

        let channels = StaticSalesChannelResolver::new()
            .with_key(PUBLISHABLE_KEY, vec![channel()])
            .with_key(EMPTY_PUBLISHABLE_KEY, Vec::new());

        let config = test_config();
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, service.clone(), Arc::new(channels));
        let router = routes::app(
            routes::routes().route("/test/login/{customer_id}", post(login)),
            state,
            session_layer,
        );

        Self {
            store,
            catalog,
            events,
            service,
            router,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Log `customer_id` in and return the session cookie (`name=value`).
    pub async fn login(&self, customer_id: &str) -> String {
        let response = self
            .send(
                Request::post(format!("/test/login/{customer_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);

        let set_cookie = response
            .headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_owned()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

async fn login(session: Session, Path(customer_id): Path<String>) -> StatusCode {
    let customer = CurrentCustomer {
        customer_id: CustomerId::parse(&customer_id).unwrap(),
    };
    set_current_customer(&session, &customer).await.unwrap();
    StatusCode::NO_CONTENT
}

/// Store request with the default publishable key and an optional session.
pub fn store_request(method: &str, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(PUBLISHABLE_KEY_HEADER, PUBLISHABLE_KEY);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
}

/// JSON body for a request builder.
pub fn json_body(value: &Value) -> Body {
    Body::from(serde_json::to_vec(value).unwrap())
}

pub fn customer(id: &str) -> CustomerId {
    CustomerId::parse(id).unwrap()
}

pub fn channel() -> SalesChannelId {
    SalesChannelId::parse(SALES_CHANNEL).unwrap()
}

pub fn variant(id: &str) -> VariantId {
    VariantId::parse(id).unwrap()
}

fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/wishlist_test"),
        host: [127, 0, 0, 1].into(),
        port: 9000,
        base_url: "http://localhost:9000".to_owned(),
        events: EventsConfig::default(),
        catalog: CatalogConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

fn seeded_catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    catalog.insert_product(CatalogProduct {
        id: ProductId::parse("prod_tee").unwrap(),
        title: "Organic Tee".to_owned(),
        handle: "organic-tee".to_owned(),
        thumbnail: Some("https://cdn.example.com/tee.png".to_owned()),
        status: ProductStatus::Published,
    });
    for (index, id) in VARIANTS.iter().enumerate() {
        catalog.insert_variant(CatalogVariant {
            id: variant(id),
            product_id: ProductId::parse("prod_tee").unwrap(),
            sku: Some(format!("TEE-{index}")),
            title: (*id).to_owned(),
        });
    }
    catalog
}
