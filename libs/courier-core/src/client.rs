use crate::error::HttpError;
use crate::options::Options;
use crate::pending::PendingResponse;
use crate::request::Request;

/// Asynchronous transport used by declarative clients.
///
/// `C` is an engine-specific call context; callers may pass one to carry
/// per-call state across several calls, or `None` to let the client create
/// a fresh one for the call.
///
/// `execute` never blocks on network I/O. It returns:
/// - `Err(_)` for configuration mistakes detectable before any I/O
///   (invalid URL or headers, unsupported content encoding, closed client);
/// - `Ok(pending)` otherwise. The transport outcome (response, failure or
///   cancellation) is delivered through `pending`.
pub trait AsyncClient<C>: Send + Sync {
    /// Dispatch `request` with per-call `options`.
    ///
    /// # Errors
    /// Returns a synchronous error if the request cannot be translated for
    /// the underlying engine, or if the client is closed.
    fn execute(
        &self,
        request: Request,
        options: &Options,
        context: Option<C>,
    ) -> Result<PendingResponse, HttpError>;
}
