//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for the session
//!   store (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the back-office
//! - `PAWPAL_API_URL` - Base URL of the PawPal REST API
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `PAWPAL_API_TIMEOUT_SECS` - REST request timeout (default: 10)
//! - `ADMIN_PAGE_SIZE` - Rows per review/ticket table page (default: 20)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//!
//! ## Optional (notifications - enables the live feed)
//! - `PAWPAL_NOTIFICATIONS_URL` - `ws://` or `wss://` URL of the notification socket
//! - `PAWPAL_NOTIFICATIONS_TOKEN` - Bearer token sent in the socket handshake

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the back-office
    pub base_url: String,
    /// PawPal REST API settings
    pub api: ApiConfig,
    /// Rows per page in the review and ticket tables
    pub page_size: usize,
    /// Live notification feed (optional)
    pub notifications: Option<NotificationsConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// PawPal REST API settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/` so relative paths join under it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

/// WebSocket notification feed settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct NotificationsConfig {
    /// `ws://` or `wss://` endpoint
    pub url: Url,
    /// Bearer token for the handshake, if the socket requires one
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for NotificationsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationsConfig")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_parsed_env::<IpAddr>("ADMIN_HOST", "127.0.0.1")?;
        let port = get_parsed_env::<u16>("ADMIN_PORT", "3001")?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;

        let api = ApiConfig::from_env()?;
        let page_size = get_parsed_env::<usize>("ADMIN_PAGE_SIZE", "20")?;
        let notifications = NotificationsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            api,
            page_size,
            notifications,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: get_parsed_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("PAWPAL_API_URL")?;
        Ok(Self {
            base_url: parse_api_url("PAWPAL_API_URL", &raw)?,
            timeout: Duration::from_secs(get_parsed_env::<u64>("PAWPAL_API_TIMEOUT_SECS", "10")?),
        })
    }
}

impl NotificationsConfig {
    /// Returns `None` when no socket URL is configured.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(raw) = get_optional_env("PAWPAL_NOTIFICATIONS_URL") else {
            return Ok(None);
        };
        Ok(Some(Self {
            url: parse_socket_url("PAWPAL_NOTIFICATIONS_URL", &raw)?,
            token: get_optional_env("PAWPAL_NOTIFICATIONS_TOKEN").map(SecretString::from),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an http(s) base URL and make sure it ends in `/`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unparseable or non-http URLs.
pub fn parse_api_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http or https URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse a WebSocket URL.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unparseable or non-ws URLs.
pub fn parse_socket_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be a ws or wss URL".to_string(),
        ));
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "https://admin.pawpal.vn".to_string(),
            api: ApiConfig {
                base_url: Url::parse("http://localhost:8080/").unwrap(),
                timeout: Duration::from_secs(10),
            },
            page_size: 20,
            notifications: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert!(config.is_secure());
    }

    #[test]
    fn test_parse_api_url_adds_trailing_slash() {
        let url = parse_api_url("PAWPAL_API_URL", "http://api.internal:8080/api").unwrap();
        assert_eq!(url.as_str(), "http://api.internal:8080/api/");
    }

    #[test]
    fn test_parse_socket_url() {
        assert!(parse_socket_url("PAWPAL_NOTIFICATIONS_URL", "wss://api.pawpal.vn/ws").is_ok());
        assert!(matches!(
            parse_socket_url("PAWPAL_NOTIFICATIONS_URL", "https://api.pawpal.vn/ws"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_notifications_debug_redacts_token() {
        let config = NotificationsConfig {
            url: Url::parse("wss://api.pawpal.vn/ws").unwrap(),
            token: Some(SecretString::from("staff-socket-token")),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("staff-socket-token"));
    }
}
