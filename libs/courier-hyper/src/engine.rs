//! Contract between the adapter and the engine that performs the I/O.

use crate::config::RequestConfig;
use crate::context::ClientContext;
use crate::native::{SimpleRequest, SimpleResponse};
use async_trait::async_trait;
use courier_core::HttpError;
use tokio_util::sync::CancellationToken;

/// How an engine shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Stop accepting work and let in-flight exchanges finish
    Graceful,
    /// Stop accepting work and cancel in-flight exchanges
    Immediate,
}

/// Receives the outcome of one submitted exchange.
///
/// The engine invokes exactly one of `completed`, `failed` or `cancelled`.
/// Consuming `self` makes a second invocation impossible.
pub trait CompletionHandler: Send + 'static {
    fn completed(self: Box<Self>, response: SimpleResponse);

    fn failed(self: Box<Self>, error: HttpError);

    fn cancelled(self: Box<Self>);

    /// Token the engine watches to abort the exchange early.
    fn cancellation(&self) -> Option<CancellationToken> {
        None
    }
}

/// Asynchronous HTTP engine.
#[async_trait]
pub trait AsyncEngine: Send + Sync + 'static {
    /// Start accepting submissions. Starting a running engine is a no-op.
    ///
    /// # Errors
    /// Returns `HttpError::NoRuntime` if the engine cannot find an async
    /// runtime, or `HttpError::Closed` if it was already closed.
    fn start(&self) -> Result<(), HttpError>;

    /// Perform `request` and report the outcome to `handler`.
    ///
    /// Never blocks on I/O. Submissions to an engine that is not running fail
    /// through the handler.
    fn submit(
        &self,
        request: SimpleRequest,
        context: ClientContext,
        handler: Box<dyn CompletionHandler>,
    );

    /// Shut down. Calling it again after completion is a no-op.
    async fn close(&self, mode: CloseMode);

    /// Engine-wide request settings, used as the base for per-call settings.
    fn default_request_config(&self) -> Option<RequestConfig> {
        None
    }
}
