//! Application configuration loaded from environment variables.

use std::time::Duration;

use clients::ClientConfig;
use domain::OrderServiceConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3002`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset means in-memory storage
/// - `CUSTOMERS_API_BASE`: customers service (default: `http://localhost:3001`)
/// - `SERVICE_TOKEN`: bearer token required on order and product routes (optional)
/// - `HTTP_TIMEOUT_MS`: customers service timeout (default: `5000`)
/// - `IDEMPOTENCY_TTL_HOURS`: confirmation replay lifetime (default: `24`)
/// - `CANCELLATION_WINDOW_SECS`: cancel window for confirmed orders (default: `600`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub customers_api_base: String,
    pub service_token: Option<String>,
    pub http_timeout: Duration,
    pub idempotency_ttl_hours: i64,
    pub cancellation_window_secs: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_blank("DATABASE_URL"),
            customers_api_base: get("CUSTOMERS_API_BASE").unwrap_or(defaults.customers_api_base),
            service_token: non_blank("SERVICE_TOKEN"),
            http_timeout: get("HTTP_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.http_timeout),
            idempotency_ttl_hours: get("IDEMPOTENCY_TTL_HOURS")
                .and_then(|h| h.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(defaults.idempotency_ttl_hours),
            cancellation_window_secs: get("CANCELLATION_WINDOW_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|s: &i64| *s >= 0)
                .unwrap_or(defaults.cancellation_window_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn customers_client(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.customers_api_base).with_timeout(self.http_timeout);
        match &self.service_token {
            Some(token) => config.with_service_token(token.clone()),
            None => config,
        }
    }

    pub fn order_service(&self) -> OrderServiceConfig {
        OrderServiceConfig {
            idempotency_ttl: chrono::Duration::hours(self.idempotency_ttl_hours),
            cancellation_window: chrono::Duration::seconds(self.cancellation_window_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            log_level: "info".to_string(),
            database_url: None,
            customers_api_base: "http://localhost:3001".to_string(),
            service_token: None,
            http_timeout: Duration::from_millis(5000),
            idempotency_ttl_hours: 24,
            cancellation_window_secs: 600,
        }
    }
}
