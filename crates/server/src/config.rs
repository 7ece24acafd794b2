//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WISHLIST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `WISHLIST_HOST` - Bind address (default: 127.0.0.1)
//! - `WISHLIST_PORT` - Listen port (default: 9000)
//! - `WISHLIST_BASE_URL` - Public URL (default: <http://localhost:9000>)
//! - `WISHLIST_EVENT_TRANSPORT` - `postgres`, `webhook` or `log` (default: postgres)
//! - `WISHLIST_EVENT_CHANNEL` - `NOTIFY` channel (default: `wishlist_events`)
//! - `WISHLIST_EVENT_QUEUE_CAPACITY` - Pending event limit (default: 1024)
//! - `WISHLIST_EVENT_WEBHOOK_URL` - Webhook endpoint (required for `webhook`)
//! - `WISHLIST_EVENT_WEBHOOK_TOKEN` - Bearer token sent to the webhook (high entropy)
//! - `WISHLIST_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL (default: 300)
//! - `WISHLIST_CATALOG_CACHE_CAPACITY` - Catalog cache entries (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Default `NOTIFY` channel for wishlist events.
pub const DEFAULT_EVENT_CHANNEL: &str = "wishlist_events";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Wishlist server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL; `https://` enables secure cookies
    pub base_url: String,
    /// Event notification settings
    pub events: EventsConfig,
    /// Catalog cache settings
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Where wishlist events are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventTransportKind {
    /// `pg_notify` on the configured channel
    #[default]
    Postgres,
    /// HTTP POST to a webhook
    Webhook,
    /// Log only
    Log,
}

impl FromStr for EventTransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "webhook" => Ok(Self::Webhook),
            "log" => Ok(Self::Log),
            other => Err(format!("expected postgres, webhook or log, got '{other}'")),
        }
    }
}

/// Event notification configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct EventsConfig {
    /// Transport used to publish events
    pub transport: EventTransportKind,
    /// `NOTIFY` channel for the postgres transport
    pub channel: String,
    /// Maximum number of queued, undelivered events
    pub queue_capacity: usize,
    /// Webhook endpoint for the webhook transport
    pub webhook_url: Option<Url>,
    /// Bearer token sent to the webhook
    pub webhook_token: Option<SecretString>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            transport: EventTransportKind::Postgres,
            channel: DEFAULT_EVENT_CHANNEL.to_owned(),
            queue_capacity: 1024,
            webhook_url: None,
            webhook_token: None,
        }
    }
}

impl std::fmt::Debug for EventsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventsConfig")
            .field("transport", &self.transport)
            .field("channel", &self.channel)
            .field("queue_capacity", &self.queue_capacity)
            .field("webhook_url", &self.webhook_url.as_ref().map(Url::as_str))
            .field(
                "webhook_token",
                &self.webhook_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Catalog cache configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// How long a cached lookup stays valid
    pub cache_ttl: Duration,
    /// Maximum cached entries per kind
    pub cache_capacity: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 10_000,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("WISHLIST_DATABASE_URL")?;
        let host = get_parsed_or_default::<IpAddr>("WISHLIST_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("WISHLIST_PORT", "9000")?;
        let base_url = get_env_or_default("WISHLIST_BASE_URL", "http://localhost:9000");

        let events = EventsConfig::from_env()?;
        let catalog = CatalogConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            events,
            catalog,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl EventsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let transport = get_parsed_or_default("WISHLIST_EVENT_TRANSPORT", "postgres")?;
        let channel = get_env_or_default("WISHLIST_EVENT_CHANNEL", DEFAULT_EVENT_CHANNEL);
        let queue_capacity = get_parsed_or_default("WISHLIST_EVENT_QUEUE_CAPACITY", "1024")?;
        let webhook_url = get_optional_env("WISHLIST_EVENT_WEBHOOK_URL")
            .map(|raw| parse_webhook_url(&raw, "WISHLIST_EVENT_WEBHOOK_URL"))
            .transpose()?;
        let webhook_token = get_optional_env("WISHLIST_EVENT_WEBHOOK_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "WISHLIST_EVENT_WEBHOOK_TOKEN")?;
                Ok(SecretString::from(token))
            })
            .transpose()?;

        let config = Self {
            transport,
            channel,
            queue_capacity,
            webhook_url,
            webhook_token,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.transport == EventTransportKind::Webhook && self.webhook_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "WISHLIST_EVENT_WEBHOOK_URL".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "WISHLIST_EVENT_QUEUE_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs: u64 = get_parsed_or_default("WISHLIST_CATALOG_CACHE_TTL_SECS", "300")?;
        let cache_capacity = get_parsed_or_default("WISHLIST_CATALOG_CACHE_CAPACITY", "10000")?;

        Ok(Self {
            cache_ttl: Duration::from_secs(ttl_secs),
            cache_capacity,
        })
    }
}

/// Load only the database URL (`WISHLIST_DATABASE_URL`, then `DATABASE_URL`).
///
/// Used by tooling that needs the database but none of the server settings.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("WISHLIST_DATABASE_URL")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., WISHLIST_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(&get_env_or_default(key, default), key)
}

fn parse_value<T>(raw: &str, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an absolute `http(s)` URL.
fn parse_webhook_url(raw: &str, key: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 9000,
            base_url: "http://localhost:9000".to_string(),
            events: EventsConfig::default(),
            catalog: CatalogConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-webhook-token", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_transport_kind_parse() {
        assert_eq!("postgres".parse::<EventTransportKind>(), Ok(EventTransportKind::Postgres));
        assert_eq!(" Webhook ".parse::<EventTransportKind>(), Ok(EventTransportKind::Webhook));
        assert_eq!("log".parse::<EventTransportKind>(), Ok(EventTransportKind::Log));
        assert!("kafka".parse::<EventTransportKind>().is_err());
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u16>("ninety", "WISHLIST_PORT").unwrap_err();
        assert!(err.to_string().contains("WISHLIST_PORT"));
    }

    #[test]
    fn test_parse_webhook_url() {
        assert!(parse_webhook_url("https://hooks.internal/wishlist", "K").is_ok());
        assert!(parse_webhook_url("ftp://hooks.internal", "K").is_err());
        assert!(parse_webhook_url("not a url", "K").is_err());
    }

    #[test]
    fn test_webhook_transport_requires_url() {
        let events = EventsConfig {
            transport: EventTransportKind::Webhook,
            ..EventsConfig::default()
        };
        assert!(matches!(
            events.validate(),
            Err(ConfigError::MissingEnvVar(key)) if key == "WISHLIST_EVENT_WEBHOOK_URL"
        ));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let events = EventsConfig {
            queue_capacity: 0,
            ..EventsConfig::default()
        };
        assert!(events.validate().is_err());
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let mut config = config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 9000);
        assert!(!config.is_secure());

        config.base_url = "https://wishlist.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_events_config_debug_redacts_token() {
        let events = EventsConfig {
            transport: EventTransportKind::Webhook,
            webhook_url: Some(Url::parse("https://hooks.internal/wishlist").unwrap()),
            webhook_token: Some(SecretString::from("super_secret_webhook_token")),
            ..EventsConfig::default()
        };

        let debug_output = format!("{events:?}");

        assert!(debug_output.contains("hooks.internal"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_webhook_token"));
    }
}
