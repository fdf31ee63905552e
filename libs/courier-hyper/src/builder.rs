use crate::config::{HyperEngineConfig, RedirectConfig, RequestConfig, TlsRootConfig};
use crate::hyper_engine::HyperEngine;
use courier_core::HttpError;
use std::time::Duration;

/// Builder for a [`HyperEngine`].
#[derive(Debug, Clone, Default)]
pub struct HyperEngineBuilder {
    config: HyperEngineConfig,
}

impl HyperEngineBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with a specific configuration
    #[must_use]
    pub fn with_config(config: HyperEngineConfig) -> Self {
        Self { config }
    }

    /// Default connect timeout for submissions without their own settings
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.request.connect_timeout = timeout;
        self
    }

    /// Default response timeout for submissions without their own settings
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.request.response_timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.request.max_redirects = max;
        self
    }

    /// Replace all default request settings
    #[must_use]
    pub fn request_config(mut self, request: RequestConfig) -> Self {
        self.config.request = request;
        self
    }

    #[must_use]
    pub fn redirect(mut self, redirect: RedirectConfig) -> Self {
        self.config.redirect = redirect;
        self
    }

    /// Set the maximum buffered response body size
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set the user agent string
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn tls_roots(mut self, roots: TlsRootConfig) -> Self {
        self.config.tls_roots = roots;
        self
    }

    /// Idle pooled connections are closed after `timeout`; `None` keeps them open
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Time a graceful close waits before cancelling in-flight exchanges
    #[must_use]
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    /// Build the engine. It accepts submissions once started.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` for an unusable user agent and
    /// `HttpError::Tls` if the TLS root store cannot be set up.
    pub fn build(self) -> Result<HyperEngine, HttpError> {
        HyperEngine::with_config(self.config)
    }
}
