use crate::builder::HyperEngineBuilder;
use crate::context::ClientContext;
use crate::engine::{AsyncEngine, CloseMode};
use crate::hyper_engine::HyperEngine;
use crate::native::loggable_uri;
use crate::request::to_simple_request;
use crate::strategy::CompletionStrategy;
use arc_swap::ArcSwapOption;
use courier_core::{AsyncClient, HttpError, Options, PendingResponse, Request, pending};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineOwnership {
    /// Created by the adapter and closed with it
    Owned,
    /// Supplied by the caller, who stays responsible for closing it
    Borrowed,
}

/// [`AsyncClient`] that dispatches calls to an [`AsyncEngine`].
///
/// `execute` translates the request, applies the per-call [`Options`] to a
/// [`ClientContext`] and submits the exchange without waiting for it. The
/// returned [`PendingResponse`] is resolved by a handler built from the
/// current [`CompletionStrategy`].
///
/// ## Example
///
/// ```rust,ignore
/// use courier_core::{Options, Request};
/// use courier_hyper::AsyncHyperClient;
///
/// let client = AsyncHyperClient::new()?;
/// let request = Request::builder(http::Method::GET, "https://api.example.com/health").build();
/// let response = client.execute(request, &Options::default(), None)?.await?;
/// client.close().await;
/// ```
pub struct AsyncHyperClient<E: AsyncEngine = HyperEngine> {
    engine: Arc<E>,
    ownership: EngineOwnership,
    strategy: ArcSwapOption<CompletionStrategy>,
    default_strategy: Arc<CompletionStrategy>,
    closed: AtomicBool,
}

impl AsyncHyperClient<HyperEngine> {
    /// Build, start and own a [`HyperEngine`] with default settings.
    ///
    /// # Errors
    /// Fails when called outside a Tokio runtime or if TLS setup fails.
    pub fn new() -> Result<Self, HttpError> {
        Self::from_builder(HyperEngine::builder())
    }

    /// Build, start and own a [`HyperEngine`] configured by `builder`.
    ///
    /// # Errors
    /// Fails when called outside a Tokio runtime or if the engine cannot be built.
    pub fn from_builder(builder: HyperEngineBuilder) -> Result<Self, HttpError> {
        let engine = builder.build()?;
        engine.start()?;
        Ok(Self::with_owned_engine(Arc::new(engine)))
    }
}

impl<E: AsyncEngine> AsyncHyperClient<E> {
    /// Use a caller-managed engine. Closing the client leaves it running.
    #[must_use]
    pub fn with_engine(engine: Arc<E>) -> Self {
        Self::from_parts(engine, EngineOwnership::Borrowed)
    }

    /// Take over `engine`: closing the client closes it gracefully.
    #[must_use]
    pub fn with_owned_engine(engine: Arc<E>) -> Self {
        Self::from_parts(engine, EngineOwnership::Owned)
    }

    fn from_parts(engine: Arc<E>, ownership: EngineOwnership) -> Self {
        Self {
            engine,
            ownership,
            strategy: ArcSwapOption::empty(),
            default_strategy: Arc::new(CompletionStrategy::default_strategy()),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    #[must_use]
    pub fn owns_engine(&self) -> bool {
        self.ownership == EngineOwnership::Owned
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Strategy used for the next call: the custom one if set, else the default.
    #[must_use]
    pub fn completion_strategy(&self) -> Arc<CompletionStrategy> {
        self.strategy
            .load_full()
            .unwrap_or_else(|| Arc::clone(&self.default_strategy))
    }

    /// Replace the strategy. Calls already dispatched keep their handler.
    pub fn set_completion_strategy(&self, strategy: CompletionStrategy) {
        self.strategy.store(Some(Arc::new(strategy)));
    }

    /// Go back to the default strategy.
    pub fn reset_completion_strategy(&self) {
        self.strategy.store(None);
    }

    /// Apply the timeouts and redirect flag of `options` to `context`.
    ///
    /// The engine's default request config, or the built-in default, is the
    /// base; whatever config `context` carried before is replaced.
    #[must_use]
    pub fn configure_timeouts_and_redirection(
        &self,
        options: &Options,
        mut context: ClientContext,
    ) -> ClientContext {
        let base = self.engine.default_request_config().unwrap_or_default();
        context.set_request_config(base.with_options(options));
        context
    }

    /// Dispatch `request` and return immediately.
    ///
    /// # Errors
    /// Returns `HttpError::Closed` after [`close`](Self::close), and translation
    /// errors (invalid URL, header or content type, deflate encoding) before
    /// anything is submitted. Every other outcome arrives through the returned
    /// [`PendingResponse`].
    pub fn execute(
        &self,
        request: Request,
        options: &Options,
        context: Option<ClientContext>,
    ) -> Result<PendingResponse, HttpError> {
        if self.is_closed() {
            return Err(HttpError::Closed);
        }

        let simple = to_simple_request(&request, options)?;
        let (slot, pending) = pending();
        let handler = self.completion_strategy().handler(Arc::new(request), slot);
        let context = self.configure_timeouts_and_redirection(options, context.unwrap_or_default());

        tracing::debug!(
            method = %simple.method(),
            url = %loggable_uri(simple.uri()),
            "dispatching request"
        );
        self.engine.submit(simple, context, handler);
        Ok(pending)
    }

    /// Stop accepting calls. An owned engine is closed gracefully, letting
    /// in-flight calls finish. Later calls are no-ops.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.ownership {
            EngineOwnership::Owned => self.engine.close(CloseMode::Graceful).await,
            EngineOwnership::Borrowed => {
                tracing::debug!("engine is caller-managed, leaving it running");
            }
        }
    }
}

impl<E: AsyncEngine> AsyncClient<ClientContext> for AsyncHyperClient<E> {
    fn execute(
        &self,
        request: Request,
        options: &Options,
        context: Option<ClientContext>,
    ) -> Result<PendingResponse, HttpError> {
        Self::execute(self, request, options, context)
    }
}

impl<E: AsyncEngine> fmt::Debug for AsyncHyperClient<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHyperClient")
            .field("ownership", &self.ownership)
            .field("custom_strategy", &self.strategy.load().is_some())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
