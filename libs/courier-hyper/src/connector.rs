//! Connect timeout applied per exchange.
//!
//! The pooled client shares one connector across all calls, so the timeout
//! cannot live on the connector itself. The exchange task scopes its own
//! limit with [`with_connect_timeout`]; the connector reads it when hyper-util
//! asks for a new connection, which happens while the exchange future is
//! being polled.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::BoxError;
use tower::Service;

tokio::task_local! {
    static CONNECT_TIMEOUT: Option<Duration>;
}

/// Run `future` with `limit` as the connect timeout of any connection it opens.
/// `None` means no limit.
pub async fn with_connect_timeout<F: Future>(limit: Option<Duration>, future: F) -> F::Output {
    CONNECT_TIMEOUT.scope(limit, future).await
}

/// Connector wrapper enforcing the connect timeout of the calling exchange.
///
/// Outside a [`with_connect_timeout`] scope the `fallback` limit applies.
/// A timed out attempt fails with an `io::ErrorKind::TimedOut` error.
#[derive(Debug, Clone)]
pub struct TimeoutConnector<C> {
    inner: C,
    fallback: Option<Duration>,
}

impl<C> TimeoutConnector<C> {
    #[must_use]
    pub fn new(inner: C, fallback: Option<Duration>) -> Self {
        Self { inner, fallback }
    }

    fn current_limit(&self) -> Option<Duration> {
        CONNECT_TIMEOUT.try_with(|limit| *limit).unwrap_or(self.fallback)
    }
}

impl<C, U> Service<U> for TimeoutConnector<C>
where
    C: Service<U>,
    C::Error: Into<BoxError>,
    C::Future: Send + 'static,
    C::Response: Send + 'static,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<C::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, target: U) -> Self::Future {
        let limit = self.current_limit();
        let connecting = self.inner.call(target);
        Box::pin(async move {
            let Some(limit) = limit else {
                return connecting.await.map_err(Into::into);
            };
            match tokio::time::timeout(limit, connecting).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect timed out after {limit:?}"),
                )) as BoxError),
            }
        })
    }
}
