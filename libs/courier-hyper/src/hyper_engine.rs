//! Pooled hyper-util engine.
//!
//! Every submission runs as its own task on the runtime captured by
//! [`AsyncEngine::start`]. All submissions share one connection pool; the
//! connect timeout of each call is applied by [`TimeoutConnector`] while that
//! call's exchange is running.

use crate::builder::HyperEngineBuilder;
use crate::config::{HyperEngineConfig, RedirectConfig, RequestConfig};
use crate::connector::{TimeoutConnector, with_connect_timeout};
use crate::context::ClientContext;
use crate::engine::{AsyncEngine, CloseMode, CompletionHandler};
use crate::native::{SimpleRequest, SimpleResponse, loggable_uri};
use crate::redirect::RedirectPolicy;
use crate::tls;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use bytes::Bytes;
use courier_core::HttpError;
use http::HeaderValue;
use http_body::Body;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;
use tower_http::follow_redirect::FollowRedirect;
use tracing::Instrument;

type PooledClient = Client<TimeoutConnector<HttpsConnector<HttpConnector>>, Full<Bytes>>;

const STATE_NEW: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// [`AsyncEngine`] backed by a pooled hyper-util client.
///
/// Lifecycle: built, then [`start`](AsyncEngine::start)ed from inside a Tokio
/// runtime, then [`close`](AsyncEngine::close)d. Submissions before start fail
/// with `HttpError::NotStarted`, after close with `HttpError::Closed`.
pub struct HyperEngine {
    config: HyperEngineConfig,
    user_agent: HeaderValue,
    client: ArcSwapOption<PooledClient>,
    runtime: OnceLock<Handle>,
    state: AtomicU8,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl HyperEngine {
    #[must_use]
    pub fn builder() -> HyperEngineBuilder {
        HyperEngineBuilder::new()
    }

    /// Build an engine from a complete configuration.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` for an unusable user agent and
    /// `HttpError::Tls` if the TLS root store cannot be set up.
    pub fn with_config(config: HyperEngineConfig) -> Result<Self, HttpError> {
        let user_agent = HeaderValue::from_str(&config.user_agent)?;
        let client = build_client(&config)?;
        Ok(Self {
            config,
            user_agent,
            client: ArcSwapOption::from_pointee(client),
            runtime: OnceLock::new(),
            state: AtomicU8::new(STATE_NEW),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &HyperEngineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CLOSED
    }

    /// Number of exchanges currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

fn build_client(config: &HyperEngineConfig) -> Result<PooledClient, HttpError> {
    let https = tls::https_connector(config.tls_roots)?;
    let connector = TimeoutConnector::new(https, config.request.connect_limit());

    let mut builder = Client::builder(TokioExecutor::new());
    // pool_idle_timeout needs the timer
    builder
        .pool_timer(TokioTimer::new())
        .pool_max_idle_per_host(config.pool_max_idle_per_host);
    if let Some(idle_timeout) = config.pool_idle_timeout {
        builder.pool_idle_timeout(idle_timeout);
    }
    Ok(builder.build(connector))
}

impl fmt::Debug for HyperEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperEngine")
            .field("config", &self.config)
            .field("state", &self.state.load(Ordering::Acquire))
            .field("pooled", &self.client.load().is_some())
            .field("in_flight", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AsyncEngine for HyperEngine {
    fn start(&self) -> Result<(), HttpError> {
        let handle = Handle::try_current().map_err(|_| HttpError::NoRuntime)?;
        self.runtime.get_or_init(|| handle);
        match self.state.compare_exchange(
            STATE_NEW,
            STATE_RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tracing::debug!("engine started");
                Ok(())
            }
            Err(STATE_RUNNING) => Ok(()),
            Err(_) => Err(HttpError::Closed),
        }
    }

    fn submit(
        &self,
        request: SimpleRequest,
        context: ClientContext,
        handler: Box<dyn CompletionHandler>,
    ) {
        match self.state.load(Ordering::Acquire) {
            STATE_RUNNING => {}
            STATE_NEW => return handler.failed(HttpError::NotStarted),
            _ => return handler.failed(HttpError::Closed),
        }
        let Some(runtime) = self.runtime.get() else {
            return handler.failed(HttpError::NotStarted);
        };

        let config = context
            .request_config()
            .cloned()
            .unwrap_or_else(|| self.config.request.clone());
        let Some(client) = self.client.load_full() else {
            return handler.failed(HttpError::Closed);
        };

        let span = tracing::debug_span!(
            "outgoing_http",
            http.method = %request.method(),
            http.url = %loggable_uri(request.uri()),
            http.status_code = tracing::field::Empty,
        );
        let exchange = Exchange {
            client: Arc::unwrap_or_clone(client),
            request: request.into_http(Some(&self.user_agent)),
            config,
            redirect: self.config.redirect.clone(),
            max_body_size: self.config.max_body_size,
        };
        let shutdown = self.shutdown.clone();

        self.tracker.spawn_on(
            run_exchange(exchange, context, handler, shutdown).instrument(span),
            runtime,
        );
    }

    async fn close(&self, mode: CloseMode) {
        if self.state.swap(STATE_CLOSED, Ordering::AcqRel) == STATE_CLOSED {
            return;
        }
        self.tracker.close();

        match mode {
            CloseMode::Immediate => self.shutdown.cancel(),
            CloseMode::Graceful => {
                let grace = self.config.shutdown_grace;
                if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
                    tracing::warn!(
                        in_flight = self.tracker.len(),
                        ?grace,
                        "shutdown grace period elapsed, cancelling remaining exchanges"
                    );
                    self.shutdown.cancel();
                }
            }
        }

        self.tracker.wait().await;
        self.client.store(None);
        tracing::debug!(?mode, "engine closed");
    }

    fn default_request_config(&self) -> Option<RequestConfig> {
        Some(self.config.request.clone())
    }
}

/// Everything one exchange needs, moved into its task.
struct Exchange {
    client: PooledClient,
    request: http::Request<Full<Bytes>>,
    config: RequestConfig,
    redirect: RedirectConfig,
    max_body_size: usize,
}

impl Exchange {
    async fn perform(self) -> Result<SimpleResponse, HttpError> {
        let Exchange {
            client,
            request,
            config,
            redirect,
            max_body_size,
        } = self;
        let response_limit = config.response_limit();
        let connect_limit = config.connect_limit();
        let connect_timeout = config.connect_timeout;

        let exchange = async move {
            let response = if config.redirects_enabled {
                let policy = RedirectPolicy::new(redirect, config.max_redirects);
                FollowRedirect::with_policy(client, policy)
                    .oneshot(request)
                    .await
            } else {
                client.request(request).await
            }
            .map_err(|e| map_client_error(e, connect_timeout))?;

            collect_limited(response, max_body_size).await
        };

        let exchange = with_connect_timeout(connect_limit, exchange);
        match response_limit {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| HttpError::Timeout(limit))?,
            None => exchange.await,
        }
    }
}

async fn run_exchange(
    exchange: Exchange,
    context: ClientContext,
    handler: Box<dyn CompletionHandler>,
    shutdown: CancellationToken,
) {
    let caller = handler.cancellation();

    let outcome = tokio::select! {
        biased;
        () = shutdown.cancelled() => None,
        () = cancelled(caller.as_ref()) => None,
        result = exchange.perform() => Some(result),
    };

    match outcome {
        Some(Ok(response)) => {
            tracing::Span::current().record("http.status_code", response.status().as_u16());
            context.record_negotiated_version(response.version());
            handler.completed(response);
        }
        Some(Err(err)) => {
            tracing::debug!(error = %err, "exchange failed");
            handler.failed(err);
        }
        None => {
            tracing::debug!("exchange cancelled");
            handler.cancelled();
        }
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Buffer the body, failing once it grows past `limit` bytes.
async fn collect_limited<B>(
    response: http::Response<B>,
    limit: usize,
) -> Result<SimpleResponse, HttpError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = response.into_parts();

    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| HttpError::Transport(e.into()))?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(http::Response::from_parts(parts, Bytes::from(collected)))
}

fn map_client_error(err: hyper_util::client::legacy::Error, connect_timeout: Duration) -> HttpError {
    let mut timed_out = false;
    let mut tls = false;
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::TimedOut
        {
            timed_out = true;
        }
        if cause.is::<rustls::Error>() {
            tls = true;
        }
        source = cause.source();
    }

    if err.is_connect() && timed_out {
        HttpError::ConnectTimeout(connect_timeout)
    } else if tls {
        HttpError::Tls(Box::new(err))
    } else {
        HttpError::Transport(Box::new(err))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn response(body: &'static str) -> http::Response<Full<Bytes>> {
        http::Response::builder()
            .status(200)
            .header("x-test", "1")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_collect_limited_within_limit() {
        let collected = collect_limited(response("hello world"), 11).await.unwrap();
        assert_eq!(collected.body().as_ref(), b"hello world");
        assert_eq!(collected.headers()["x-test"], "1");
    }

    #[tokio::test]
    async fn test_collect_limited_rejects_oversized_body() {
        let err = collect_limited(response("hello world"), 5).await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::BodyTooLarge {
                limit: 5,
                actual: 11
            }
        ));
    }

    #[test]
    fn test_submit_before_start_fails_handler() {
        struct Expect(std::sync::mpsc::Sender<HttpError>);
        impl CompletionHandler for Expect {
            fn completed(self: Box<Self>, _response: SimpleResponse) {
                panic!("unexpected completion");
            }
            fn failed(self: Box<Self>, error: HttpError) {
                self.0.send(error).unwrap();
            }
            fn cancelled(self: Box<Self>) {
                panic!("unexpected cancellation");
            }
        }

        let engine = HyperEngine::builder().build().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let request = SimpleRequest::new(http::Method::GET, "http://localhost/".parse().unwrap());
        engine.submit(request, ClientContext::new(), Box::new(Expect(tx)));

        assert!(matches!(rx.recv().unwrap(), HttpError::NotStarted));
    }

    #[test]
    fn test_start_without_runtime() {
        let engine = HyperEngine::builder().build().unwrap();
        assert!(matches!(engine.start(), Err(HttpError::NoRuntime)));
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let engine = HyperEngine::builder().build().unwrap();
        engine.start().unwrap();
        engine.start().unwrap();
        assert!(engine.is_running());

        engine.close(CloseMode::Graceful).await;
        engine.close(CloseMode::Immediate).await;
        assert!(engine.is_closed());
        assert!(matches!(engine.start(), Err(HttpError::Closed)));
    }

    #[tokio::test]
    async fn test_close_releases_pool() {
        let engine = HyperEngine::builder().build().unwrap();
        engine.start().unwrap();
        assert!(engine.client.load().is_some());

        engine.close(CloseMode::Graceful).await;
        assert!(engine.client.load().is_none());
    }

    #[test]
    fn test_default_request_config_exposed() {
        let engine = HyperEngine::builder().max_redirects(4).build().unwrap();
        assert_eq!(engine.default_request_config().unwrap().max_redirects, 4);
    }
}
