//! Wishlist server binary.
//!
//! Serves the store wishlist API on port 9000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON only
//! - `PostgreSQL` for wishlists, read-only access to the catalog tables
//! - Sessions shared with the storefront via tower-sessions
//! - Events published best-effort through `pg_notify`, a webhook or the log

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::time::Duration;

use sentry::integrations::tracing as sentry_tracing;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wishlist_server::config::{EventTransportKind, ServerConfig};
use wishlist_server::db::{self, PgWishlistStore};
use wishlist_server::middleware::{api_rate_limiter, create_session_layer};
use wishlist_server::routes;
use wishlist_server::services::{
    CachedCatalog, EventTransport, LogTransport, Notifier, PgCatalog, PgNotifyTransport,
    PgSalesChannelResolver, WebhookTransport, WishlistService,
};
use wishlist_server::state::AppState;

/// How long queued events may take to drain on shutdown.
const EVENT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Build the configured event transport.
fn event_transport(
    config: &ServerConfig,
    pool: &sqlx::PgPool,
) -> Result<Arc<dyn EventTransport>, Box<dyn std::error::Error>> {
    let events = &config.events;
    let transport: Arc<dyn EventTransport> = match events.transport {
        EventTransportKind::Postgres => {
            Arc::new(PgNotifyTransport::new(pool.clone(), events.channel.clone()))
        }
        EventTransportKind::Webhook => {
            let url = events
                .webhook_url
                .clone()
                .ok_or("WISHLIST_EVENT_WEBHOOK_URL is required for the webhook transport")?;
            Arc::new(WebhookTransport::new(url, events.webhook_token.clone())?)
        }
        EventTransportKind::Log => Arc::new(LogTransport),
    };
    Ok(transport)
}

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wishlist_server=info,tower_http=debug".into());

    // Use JSON format on Fly.io for structured log parsing, text format locally
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p wishlist-cli -- migrate

    let transport = event_transport(&config, &pool).expect("Failed to create event transport");
    let (notifier, event_worker) = Notifier::spawn(transport, config.events.queue_capacity);
    tracing::info!(transport = ?config.events.transport, "Event notifier started");

    let catalog = CachedCatalog::new(
        PgCatalog::new(pool.clone()),
        config.catalog.cache_ttl,
        config.catalog.cache_capacity,
    );
    let wishlists = WishlistService::new(
        Arc::new(PgWishlistStore::new(pool.clone())),
        Arc::new(catalog),
        notifier,
    );
    let channels = Arc::new(PgSalesChannelResolver::new(pool.clone()));
    let state = AppState::new(config.clone(), wishlists, channels);

    let session_layer = create_session_layer(PostgresStore::new(pool), &config);

    let app = routes::app(
        routes::health_routes().merge(routes::store_routes().layer(api_rate_limiter())),
        state,
        session_layer,
    )
    // Sentry layers (outermost for full request coverage)
    .layer(sentry_tower::NewSentryLayer::new_from_top())
    .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("wishlist server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // The router (and with it every notifier) is gone; let queued events drain
    if tokio::time::timeout(EVENT_DRAIN_TIMEOUT, event_worker)
        .await
        .is_err()
    {
        tracing::warn!("Timed out delivering queued events");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
