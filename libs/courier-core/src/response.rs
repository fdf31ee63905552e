use crate::error::HttpError;
use crate::headers::HeaderMultimap;
use crate::protocol::ProtocolVersion;
use crate::request::Request;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Transport-agnostic HTTP response.
///
/// Constructed once through [`Response::builder`] and immutable afterwards.
/// Keeps the originating [`Request`] as a read-only back-reference.
#[derive(Debug, Clone)]
pub struct Response {
    protocol_version: ProtocolVersion,
    status: u16,
    reason: Option<String>,
    headers: HeaderMultimap,
    request: Arc<Request>,
    body: Option<Bytes>,
}

impl Response {
    /// Start building a response for `request`.
    pub fn builder(status: u16, request: Arc<Request>) -> ResponseBuilder {
        ResponseBuilder {
            response: Response {
                protocol_version: ProtocolVersion::Http11,
                status,
                reason: None,
                headers: HeaderMultimap::new(),
                request,
                body: None,
            },
        }
    }

    #[must_use]
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMultimap {
        &self.headers
    }

    /// The request this response answers.
    #[must_use]
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text. Invalid UTF-8 sequences are replaced with U+FFFD.
    #[must_use]
    pub fn text(&self) -> String {
        self.body
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    /// Returns `HttpError::Json` if the body is absent or not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let body = self.body.as_deref().unwrap_or_default();
        Ok(serde_json::from_slice(body)?)
    }

    /// Return an error for non-2xx responses.
    ///
    /// # Errors
    /// Returns `HttpError::HttpStatus` if the status is not 2xx.
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(HttpError::HttpStatus {
            status: self.status,
            reason: self.reason,
        })
    }
}

/// Builder for [`Response`].
#[must_use = "ResponseBuilder does nothing until .build() is called"]
#[derive(Debug)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.response.protocol_version = version;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.response.reason = Some(reason.into());
        self
    }

    pub fn headers(mut self, headers: HeaderMultimap) -> Self {
        self.response.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.response.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Response {
        self.response
    }
}
