//! Backend connection configuration.

use std::time::Duration;

/// Connection settings for the generation backend.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Bearer token, if the backend requires one.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RpcConfig {
    /// Config for a backend at the given base URL, no auth, 30s timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
