//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AUTOCATALOG_DATABASE_URL` - `SQLite` connection string
//!
//! ## Optional
//! - `AUTOCATALOG_HOST` - Bind address (default: 127.0.0.1)
//! - `AUTOCATALOG_PORT` - Listen port (default: 3000)
//! - `AUTOCATALOG_BASE_URL` - Public URL (default: `http://localhost:3000`)
//! - `AUTOCATALOG_DOWNLOAD_BASE_URL` - Prefix for download links (default: `{base_url}/downloads`)
//! - `AUTOCATALOG_DOWNLOAD_TTL_DAYS` - Download link lifetime in days (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `SQLite` database URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Prefix for checkout download links
    pub download_base_url: String,
    /// Lifetime of checkout download links
    pub download_ttl_days: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors reported to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
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

        let database_url = SecretString::from(get_required_env("AUTOCATALOG_DATABASE_URL")?);
        let host = parse_env_or_default("AUTOCATALOG_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("AUTOCATALOG_PORT", "3000")?;
        let base_url = get_env_or_default("AUTOCATALOG_BASE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_owned();
        let download_base_url = get_optional_env("AUTOCATALOG_DOWNLOAD_BASE_URL")
            .map_or_else(|| format!("{base_url}/downloads"), |url| {
                url.trim_end_matches('/').to_owned()
            });
        let download_ttl_days = parse_env_or_default("AUTOCATALOG_DOWNLOAD_TTL_DAYS", "30")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            download_base_url,
            download_ttl_days,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for tests and local tooling: binds to localhost and
    /// derives every URL from `base_url`.
    #[must_use]
    pub fn local(database_url: &str, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_owned();
        Self {
            database_url: SecretString::from(database_url.to_owned()),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            download_base_url: format!("{base_url}/downloads"),
            base_url,
            download_ttl_days: 30,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
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

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::local("sqlite::memory:", "http://localhost:3000/");

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(config.download_base_url, "http://localhost:3000/downloads");
        assert!(!config.is_secure());
    }

    #[test]
    fn test_parse_value_reports_variable() {
        let err = parse_value::<u16>("AUTOCATALOG_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "AUTOCATALOG_PORT"));

        let ttl: u32 = parse_value("AUTOCATALOG_DOWNLOAD_TTL_DAYS", " 7 ").unwrap();
        assert_eq!(ttl, 7);
    }
}
