//! Single-assignment result handle returned by `execute`.
//!
//! [`pending`] creates a connected pair:
//! - [`ResponseSlot`] is the completer side, held by whatever bridges the
//!   engine's completion back to the caller;
//! - [`PendingResponse`] is the caller side, a future that resolves exactly once.
//!
//! The first of `complete`, `fail` or `cancel` wins. Later attempts return
//! `false` and change nothing.

use crate::error::HttpError;
use crate::response::Response;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

type Outcome = Result<Response, HttpError>;

struct SlotState {
    /// `Some` until the slot is resolved
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
    cancellation: CancellationToken,
}

/// Create a connected completer / pending-response pair.
#[must_use]
pub fn pending() -> (ResponseSlot, PendingResponse) {
    let (sender, receiver) = oneshot::channel();
    let cancellation = CancellationToken::new();
    let state = Arc::new(SlotState {
        sender: Mutex::new(Some(sender)),
        cancellation: cancellation.clone(),
    });
    let pending = PendingResponse {
        receiver,
        state: Arc::downgrade(&state),
        cancellation,
    };
    (ResponseSlot { state }, pending)
}

/// Completer side of a [`PendingResponse`].
///
/// Cheap to clone. When every clone is dropped without resolving, the
/// pending response resolves to `HttpError::CompletionDropped`.
#[derive(Clone)]
pub struct ResponseSlot {
    state: Arc<SlotState>,
}

impl ResponseSlot {
    fn resolve(&self, outcome: Outcome) -> bool {
        let Some(sender) = self.state.sender.lock().take() else {
            return false;
        };
        if sender.send(outcome).is_err() {
            tracing::trace!("pending response dropped before it was resolved");
        }
        true
    }

    /// Resolve with a response. Returns `false` if already resolved.
    pub fn complete(&self, response: Response) -> bool {
        self.resolve(Ok(response))
    }

    /// Resolve with an error, unchanged. Returns `false` if already resolved.
    pub fn fail(&self, error: HttpError) -> bool {
        self.resolve(Err(error))
    }

    /// Resolve as cancelled. Returns `false` if already resolved.
    pub fn cancel(&self) -> bool {
        let resolved = self.resolve(Err(HttpError::Cancelled));
        self.state.cancellation.cancel();
        resolved
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.sender.lock().is_none()
    }

    /// Token fired when the caller cancels or drops the pending response.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.state.cancellation.clone()
    }
}

impl fmt::Debug for ResponseSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSlot")
            .field("resolved", &self.is_resolved())
            .field("cancelled", &self.state.cancellation.is_cancelled())
            .finish()
    }
}

/// Caller side of an in-flight call.
///
/// Resolves to `Ok(Response)`, `Err(error)` or `Err(HttpError::Cancelled)`,
/// exactly once. Dropping an unresolved `PendingResponse` signals the engine
/// that the result is no longer wanted.
#[must_use = "the call result is lost unless the PendingResponse is awaited"]
pub struct PendingResponse {
    receiver: oneshot::Receiver<Outcome>,
    state: Weak<SlotState>,
    cancellation: CancellationToken,
}

impl PendingResponse {
    /// Cancel the call.
    ///
    /// Resolves the response as cancelled unless it already resolved, and
    /// signals the engine so it can abort the exchange. Returns `true` if this
    /// call performed the resolution.
    pub fn cancel(&mut self) -> bool {
        let resolved = self
            .state
            .upgrade()
            .is_some_and(|state| ResponseSlot { state }.resolve(Err(HttpError::Cancelled)));
        self.cancellation.cancel();
        resolved
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called or the engine
    /// reported cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(HttpError::CompletionDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

impl fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse")
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}
