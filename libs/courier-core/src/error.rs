use std::time::Duration;
use thiserror::Error;

/// Errors produced by courier clients.
///
/// Two delivery paths exist:
/// - configuration and translation errors (`InvalidUri`, `InvalidHeaderName`,
///   `InvalidHeaderValue`, `InvalidContentType`, `UnsupportedEncoding`, `Closed`)
///   are returned synchronously from `execute` before any I/O starts;
/// - everything else is delivered through the [`PendingResponse`] of the call.
///
/// [`PendingResponse`]: crate::PendingResponse
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// URL could not be parsed or is not absolute
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        /// The URL that failed to parse
        url: String,
        /// Diagnostic message (unstable format, for logging only)
        reason: String,
    },

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// `Content-Type` header could not be parsed as a media type
    #[error("Invalid Content-Type '{value}': {reason}")]
    InvalidContentType { value: String, reason: String },

    /// Request declares a `Content-Encoding` the transport cannot produce
    #[error("{0} Content-Encoding is not supported")]
    UnsupportedEncoding(String),

    /// Engine reported a protocol version with no transport-level counterpart
    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(String),

    /// Connection could not be established within the connect timeout
    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Exchange did not complete within the response timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport error (network, connection, protocol)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body exceeded size limit
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// HTTP non-2xx status, produced only by [`Response::error_for_status`]
    ///
    /// [`Response::error_for_status`]: crate::Response::error_for_status
    #[error("HTTP {status}: {}", .reason.as_deref().unwrap_or(""))]
    HttpStatus { status: u16, reason: Option<String> },

    /// JSON (de)serialization error
    #[error("JSON processing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The call was cancelled before a response was produced
    #[error("Request cancelled")]
    Cancelled,

    /// The client or its engine has been closed
    #[error("Client closed")]
    Closed,

    /// The engine was used before being started
    #[error("Engine not started")]
    NotStarted,

    /// The engine needs a Tokio runtime and none is running on this thread
    #[error("No Tokio runtime available to drive the engine")]
    NoRuntime,

    /// Every completer of a pending response went away without resolving it
    #[error("Completion handler dropped without resolving the response")]
    CompletionDropped,
}

impl HttpError {
    /// Returns `true` for the cancellation outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpError::Cancelled)
    }

    /// Returns `true` for either of the two timeout kinds.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Timeout(_) | HttpError::ConnectTimeout(_))
    }
}
