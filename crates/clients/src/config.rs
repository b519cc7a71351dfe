//! Client configuration.

use std::time::Duration;

/// Default time budget for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Where a client sends requests and how it authenticates.
///
/// Passed in at construction; clients never read the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the target service, e.g. `http://localhost:3001`.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub service_token: Option<String>,
    /// Per-request timeout. Requests are never retried.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_service_token(mut self, token: impl Into<String>) -> Self {
        self.service_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
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
    fn url_joins_without_double_slashes() {
        let config = ClientConfig::new("http://localhost:3001/");
        assert_eq!(
            config.url("/internal/customers/4"),
            "http://localhost:3001/internal/customers/4"
        );
    }

    #[test]
    fn builder_sets_token_and_timeout() {
        let config = ClientConfig::new("http://x")
            .with_service_token("secret")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.service_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }
}
