//! Orchestrator configuration loaded from environment variables.

use std::time::Duration;

use clients::ClientConfig;

use crate::orchestrator::CompensationPolicy;

/// Orchestrator configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3003`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `CUSTOMERS_API_BASE`: customers service (default: `http://localhost:3001`)
/// - `ORDERS_API_BASE`: orders service (default: `http://localhost:3002`)
/// - `SERVICE_TOKEN`: bearer token sent to both services (optional)
/// - `HTTP_TIMEOUT_MS`: per-request timeout (default: `5000`)
/// - `COMPENSATE_ON_CONFIRM_FAILURE`: cancel the order if confirm fails (default: `false`)
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub customers_api_base: String,
    pub orders_api_base: String,
    pub service_token: Option<String>,
    pub http_timeout: Duration,
    pub compensate_on_confirm_failure: bool,
}

impl OrchestratorConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            customers_api_base: get("CUSTOMERS_API_BASE").unwrap_or(defaults.customers_api_base),
            orders_api_base: get("ORDERS_API_BASE").unwrap_or(defaults.orders_api_base),
            service_token: get("SERVICE_TOKEN").filter(|t| !t.trim().is_empty()),
            http_timeout: get("HTTP_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.http_timeout),
            compensate_on_confirm_failure: get("COMPENSATE_ON_CONFIRM_FAILURE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.compensate_on_confirm_failure),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn customers_client(&self) -> ClientConfig {
        self.client_config(&self.customers_api_base)
    }

    pub fn orders_client(&self) -> ClientConfig {
        self.client_config(&self.orders_api_base)
    }

    pub fn compensation(&self) -> CompensationPolicy {
        if self.compensate_on_confirm_failure {
            CompensationPolicy::CancelOrder
        } else {
            CompensationPolicy::None
        }
    }

    fn client_config(&self, base_url: &str) -> ClientConfig {
        let config = ClientConfig::new(base_url).with_timeout(self.http_timeout);
        match &self.service_token {
            Some(token) => config.with_service_token(token.clone()),
            None => config,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3003,
            log_level: "info".to_string(),
            customers_api_base: "http://localhost:3001".to_string(),
            orders_api_base: "http://localhost:3002".to_string(),
            service_token: None,
            http_timeout: Duration::from_millis(5000),
            compensate_on_confirm_failure: false,
        }
    }
}
