//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Where the stores persist and which storefront the cart mirrors to.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Storefront base URL, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Directory holding one JSON document per storage slot.
    pub storage_dir: PathBuf,
    /// Per-request timeout for mirror calls.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a configuration with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            storage_dir: storage_dir.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join an API path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slashes() {
        let config = ClientConfig::new("http://localhost:3000/", "/tmp/x");
        assert_eq!(config.url("/api/cart"), "http://localhost:3000/api/cart");
        assert_eq!(config.url("api/cart/sync"), "http://localhost:3000/api/cart/sync");
    }
}
