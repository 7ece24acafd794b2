//! Best-effort wishlist event notification.
//!
//! Write operations hand events to a [`Notifier`], which enqueues them on a
//! bounded channel and returns immediately. A single background task drains
//! the queue in order and publishes through an [`EventTransport`]. Publish
//! failures are logged and dropped; they never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use wishlist_core::WishlistEvent;

/// Timeout for a single webhook delivery.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from publishing an event.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The event could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The receiver answered with a non-success status.
    #[error("rejected: {status} - {message}")]
    Rejected { status: u16, message: String },
}

/// Delivers events to their subscribers.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: &WishlistEvent) -> Result<(), TransportError>;
}

// =============================================================================
// Notifier
// =============================================================================

/// Fire-and-forget event emitter.
///
/// Cheap to clone; all clones feed the same queue.
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::Sender<WishlistEvent>,
}

impl Notifier {
    /// Start the delivery task and return a notifier feeding it.
    ///
    /// The task ends once every `Notifier` clone has been dropped and the
    /// queue is drained.
    #[must_use]
    pub fn spawn(transport: Arc<dyn EventTransport>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(deliver(receiver, transport));
        (Self { sender }, handle)
    }

    /// Queue an event for delivery without waiting for it.
    ///
    /// Drops the event with a warning if the queue is full or closed.
    pub fn notify(&self, event: WishlistEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    event = event.name(),
                    wishlist_id = %event.wishlist_id(),
                    "Event queue full, dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    event = event.name(),
                    wishlist_id = %event.wishlist_id(),
                    "Event queue closed, dropping event"
                );
            }
        }
    }
}

async fn deliver(mut receiver: mpsc::Receiver<WishlistEvent>, transport: Arc<dyn EventTransport>) {
    while let Some(event) = receiver.recv().await {
        match transport.publish(&event).await {
            Ok(()) => {
                debug!(event = event.name(), wishlist_id = %event.wishlist_id(), "Event published");
            }
            Err(e) => {
                error!(
                    event = event.name(),
                    wishlist_id = %event.wishlist_id(),
                    error = %e,
                    "Failed to publish event"
                );
            }
        }
    }

    debug!("Event queue closed");
}

// =============================================================================
// Transports
// =============================================================================

/// Publishes envelopes with `pg_notify` on a fixed channel.
#[derive(Clone)]
pub struct PgNotifyTransport {
    pool: PgPool,
    channel: String,
}

impl PgNotifyTransport {
    /// Create a transport notifying on `channel`.
    #[must_use]
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl EventTransport for PgNotifyTransport {
    async fn publish(&self, event: &WishlistEvent) -> Result<(), TransportError> {
        let envelope = event.to_envelope()?;

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(&self.channel)
            .bind(envelope.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// POSTs envelopes as JSON to a webhook endpoint.
#[derive(Clone)]
pub struct WebhookTransport {
    client: reqwest::Client,
    url: Url,
    token: Option<SecretString>,
}

impl WebhookTransport {
    /// Create a webhook transport.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(url: Url, token: Option<SecretString>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;

        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl EventTransport for WebhookTransport {
    async fn publish(&self, event: &WishlistEvent) -> Result<(), TransportError> {
        let envelope = event.to_envelope()?;

        let mut request = self.client.post(self.url.clone()).json(&envelope);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Writes envelopes to the log. Useful for local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl EventTransport for LogTransport {
    async fn publish(&self, event: &WishlistEvent) -> Result<(), TransportError> {
        let envelope = event.to_envelope()?;
        info!(event = event.name(), payload = %envelope, "Wishlist event");
        Ok(())
    }
}
