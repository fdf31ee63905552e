//! Completion strategies: how engine outcomes reach the caller's
//! [`PendingResponse`](courier_core::PendingResponse).

use crate::engine::CompletionHandler;
use crate::native::SimpleResponse;
use crate::response::to_response;
use courier_core::{HttpError, Request, ResponseSlot};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type HandlerFactory =
    dyn Fn(Arc<Request>, ResponseSlot) -> Box<dyn CompletionHandler> + Send + Sync;

/// Factory producing one [`CompletionHandler`] per call.
///
/// The handler receives the original request and the completer of the
/// pending response returned to the caller. Custom strategies can wrap
/// [`ResponseSlotHandler`] to observe outcomes before they are delivered.
pub struct CompletionStrategy {
    factory: Box<HandlerFactory>,
}

impl CompletionStrategy {
    #[must_use]
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(Arc<Request>, ResponseSlot) -> Box<dyn CompletionHandler> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
        }
    }

    /// Translate responses and resolve the slot with the outcome.
    #[must_use]
    pub fn default_strategy() -> Self {
        Self::new(|request, slot| Box::new(ResponseSlotHandler::new(request, slot)))
    }

    #[must_use]
    pub fn handler(&self, request: Arc<Request>, slot: ResponseSlot) -> Box<dyn CompletionHandler> {
        (self.factory)(request, slot)
    }
}

impl Default for CompletionStrategy {
    fn default() -> Self {
        Self::default_strategy()
    }
}

impl fmt::Debug for CompletionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionStrategy").finish_non_exhaustive()
    }
}

/// Default handler.
///
/// - completed: the response is translated and the slot completed; a
///   translation failure fails the slot instead
/// - failed: the error is passed on unchanged
/// - cancelled: the slot resolves as cancelled
#[derive(Debug)]
pub struct ResponseSlotHandler {
    request: Arc<Request>,
    slot: ResponseSlot,
}

impl ResponseSlotHandler {
    #[must_use]
    pub fn new(request: Arc<Request>, slot: ResponseSlot) -> Self {
        Self { request, slot }
    }
}

impl CompletionHandler for ResponseSlotHandler {
    fn completed(self: Box<Self>, response: SimpleResponse) {
        let delivered = match to_response(response, self.request) {
            Ok(response) => self.slot.complete(response),
            Err(err) => {
                tracing::warn!(error = %err, "failed to translate engine response");
                self.slot.fail(err)
            }
        };
        if !delivered {
            tracing::trace!("call already resolved, response discarded");
        }
    }

    fn failed(self: Box<Self>, error: HttpError) {
        self.slot.fail(error);
    }

    fn cancelled(self: Box<Self>) {
        self.slot.cancel();
    }

    fn cancellation(&self) -> Option<CancellationToken> {
        Some(self.slot.cancellation())
    }
}
