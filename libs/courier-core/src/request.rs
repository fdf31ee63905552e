use crate::error::HttpError;
use crate::headers::HeaderMultimap;
use bytes::Bytes;
use serde::Serialize;

/// Charset recorded for bodies produced by [`RequestBuilder::body_string`] and
/// [`RequestBuilder::json`].
pub const UTF_8: &str = "UTF-8";

/// Transport-agnostic HTTP request.
///
/// Built once with [`Request::builder`] and read-only afterwards. Clients
/// translate it into their engine's own request type; the original is kept
/// as the back-reference of the resulting [`Response`](crate::Response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: http::Method,
    url: String,
    headers: HeaderMultimap,
    body: Option<Bytes>,
    charset: Option<String>,
}

impl Request {
    /// Start building a request for `method` and `url`.
    pub fn builder(method: http::Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            request: Request {
                method,
                url: url.into(),
                headers: HeaderMultimap::new(),
                body: None,
                charset: None,
            },
        }
    }

    #[must_use]
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMultimap {
        &self.headers
    }

    /// Raw body bytes, if a body was set (possibly empty).
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Charset the body was encoded with, if declared.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }
}

/// Fluent builder for [`Request`].
#[must_use = "RequestBuilder does nothing until .build() is called"]
#[derive(Debug)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Add a header value. Values form a set per name: adding a value that is
    /// already present under the same name is a no-op.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        let already_present = self
            .request
            .headers
            .get(&name)
            .is_some_and(|values| values.contains(&value));
        if !already_present {
            self.request.headers.append(name, value);
        }
        self
    }

    /// Add several headers at once.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    /// Set a raw body and the charset it was encoded with.
    pub fn body_bytes(mut self, body: impl Into<Bytes>, charset: Option<&str>) -> Self {
        self.request.body = Some(body.into());
        self.request.charset = charset.map(str::to_owned);
        self
    }

    /// Set a UTF-8 text body.
    pub fn body_string(self, body: impl Into<String>) -> Self {
        self.body_bytes(Bytes::from(body.into()), Some(UTF_8))
    }

    /// Serialize `body` as JSON. Adds `Content-Type: application/json` unless
    /// a `Content-Type` header is already present.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Json` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        let json = serde_json::to_vec(body)?;
        if !self.request.headers.contains(http::header::CONTENT_TYPE.as_str()) {
            self.request
                .headers
                .append("Content-Type", "application/json");
        }
        Ok(self.body_bytes(json, Some(UTF_8)))
    }

    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}
