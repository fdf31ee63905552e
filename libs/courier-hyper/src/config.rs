use courier_core::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, Options};
use std::time::Duration;

/// Default User-Agent string for HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("courier-hyper/", env!("CARGO_PKG_VERSION"));

/// Default maximum buffered response body size (10 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default redirect limit per request
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Per-request engine settings.
///
/// Travels with every submission inside the [`ClientContext`](crate::ClientContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Time allowed to establish a connection; zero means no limit
    pub connect_timeout: Duration,
    /// Time allowed for the whole exchange, body included; zero means no limit
    pub response_timeout: Duration,
    /// Whether 3xx responses with a `Location` are followed
    pub redirects_enabled: bool,
    /// Redirects followed before the last 3xx is returned as is
    pub max_redirects: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: DEFAULT_READ_TIMEOUT,
            redirects_enabled: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl RequestConfig {
    /// Copy of `self` with the per-call timeouts and redirect flag of `options`.
    #[must_use]
    pub fn with_options(&self, options: &Options) -> Self {
        Self {
            connect_timeout: options.connect_timeout(),
            response_timeout: options.read_timeout(),
            redirects_enabled: options.is_follow_redirects(),
            max_redirects: self.max_redirects,
        }
    }

    /// Connect timeout to enforce, `None` when disabled.
    #[must_use]
    pub fn connect_limit(&self) -> Option<Duration> {
        non_zero(self.connect_timeout)
    }

    /// Exchange timeout to enforce, `None` when disabled.
    #[must_use]
    pub fn response_limit(&self) -> Option<Duration> {
        non_zero(self.response_timeout)
    }
}

fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// Redirect security settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectConfig {
    /// Remove `Authorization`, `Cookie` and `Proxy-Authorization` once a
    /// redirect leaves the original origin
    pub strip_sensitive_headers: bool,
    /// Follow redirects from `https` to `http`
    pub allow_https_downgrade: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            strip_sensitive_headers: true,
            allow_https_downgrade: false,
        }
    }
}

impl RedirectConfig {
    /// Permissive settings for local test servers.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            strip_sensitive_headers: true,
            allow_https_downgrade: true,
        }
    }
}

/// Root certificate source for TLS connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsRootConfig {
    /// Mozilla roots bundled at compile time
    #[default]
    WebPki,
    /// Roots from the OS certificate store, loaded once per process
    Native,
}

/// Configuration of a [`HyperEngine`](crate::HyperEngine).
#[derive(Debug, Clone)]
pub struct HyperEngineConfig {
    /// Settings used when a submission carries none
    pub request: RequestConfig,
    pub redirect: RedirectConfig,
    /// Responses with larger bodies fail with `HttpError::BodyTooLarge`
    pub max_body_size: usize,
    /// Sent when the request has no `User-Agent` header
    pub user_agent: String,
    pub tls_roots: TlsRootConfig,
    /// Idle pooled connections are closed after this long; `None` keeps them
    pub pool_idle_timeout: Option<Duration>,
    pub pool_max_idle_per_host: usize,
    /// Time a graceful close waits for in-flight exchanges
    pub shutdown_grace: Duration,
}

impl Default for HyperEngineConfig {
    fn default() -> Self {
        Self {
            request: RequestConfig::default(),
            redirect: RedirectConfig::default(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            tls_roots: TlsRootConfig::default(),
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl HyperEngineConfig {
    /// Small pool, short grace period, 1 MiB bodies.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            max_body_size: 1024 * 1024,
            pool_idle_timeout: Some(Duration::from_secs(30)),
            pool_max_idle_per_host: 4,
            shutdown_grace: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Short timeouts and permissive redirects for local mock servers.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request: RequestConfig {
                connect_timeout: Duration::from_secs(2),
                response_timeout: Duration::from_secs(5),
                ..RequestConfig::default()
            },
            redirect: RedirectConfig::for_testing(),
            pool_idle_timeout: None,
            shutdown_grace: Duration::from_secs(5),
            ..Self::default()
        }
    }
}
