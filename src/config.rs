//! Client configuration
//!
//! `ClientConfig` carries everything the HTTP client and its response cache
//! need. Defaults match the production backend; the CLI (and its environment
//! variables) override them.

use std::time::Duration;

/// Default backend base URL
pub const DEFAULT_BASE_URL: &str = "http://odorok.duckdns.org:8080/api";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of cached read responses
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Configuration for [`crate::api::ApiClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to, without a trailing slash
    pub base_url: String,
    /// Timeout applied to each HTTP request
    pub timeout: Duration,
    /// How long successful read responses are cached (zero disables caching)
    pub cache_ttl: Duration,
    /// Interval of the background purge of expired entries, if enabled
    pub sweep_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: None,
        }
    }
}

impl ClientConfig {
    /// Sets the base URL, dropping any trailing slashes
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Joins an endpoint path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://odorok.duckdns.org:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.sweep_interval.is_none());
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let config = ClientConfig::default().with_base_url("http://localhost:8080/api//");
        assert_eq!(config.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_url_joins_paths() {
        let config = ClientConfig::default().with_base_url("http://localhost/api");
        assert_eq!(config.url("/courses"), "http://localhost/api/courses");
        assert_eq!(config.url("regions/sido"), "http://localhost/api/regions/sido");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(30))
            .with_cache_ttl(Duration::ZERO)
            .with_sweep_interval(Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(60)));
    }
}
