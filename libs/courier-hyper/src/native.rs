//! Engine-native request and response types.
//!
//! [`SimpleRequest`] is the fully materialized form handed to an
//! [`AsyncEngine`](crate::AsyncEngine): validated URI, ordered header pairs and
//! an optional body already encoded for the wire. [`SimpleResponse`] is what the
//! engine hands back once the body has been buffered.

use bytes::Bytes;
use courier_core::HttpError;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue, USER_AGENT};
use http::{Method, Uri, Version};
use http_body_util::Full;
use std::fmt;

/// Buffered engine response.
pub type SimpleResponse = http::Response<Bytes>;

/// Parsed media type with its header rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    mime: mime::Mime,
    header: HeaderValue,
}

impl ContentType {
    /// Parse a `Content-Type` header value.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidContentType` if `value` is not a valid media type.
    pub fn parse(value: &str) -> Result<Self, HttpError> {
        let invalid = |reason: String| HttpError::InvalidContentType {
            value: value.to_owned(),
            reason,
        };
        let mime: mime::Mime = value
            .trim()
            .parse()
            .map_err(|e: mime::FromStrError| invalid(e.to_string()))?;
        let header = HeaderValue::from_str(mime.as_ref()).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { mime, header })
    }

    #[must_use]
    pub fn mime(&self) -> &mime::Mime {
        &self.mime
    }

    /// The `charset` parameter, if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.mime.get_param(mime::CHARSET).map(|name| name.as_str())
    }

    /// Same media type with a `charset` parameter appended.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidContentType` if `charset` is not a valid parameter value.
    pub fn with_charset(&self, charset: &str) -> Result<Self, HttpError> {
        Self::parse(&format!("{}; charset={charset}", self.mime))
    }

    #[must_use]
    pub fn header_value(&self) -> &HeaderValue {
        &self.header
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime.as_ref())
    }
}

/// Request body as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleBody {
    bytes: Bytes,
    content_type: Option<ContentType>,
}

impl SimpleBody {
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }
}

/// Engine-native request.
#[derive(Debug, Clone)]
pub struct SimpleRequest {
    method: Method,
    uri: Uri,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<SimpleBody>,
}

impl SimpleRequest {
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a header pair. Existing values for the same name are kept.
    pub fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.push((name, value));
    }

    pub fn set_body(&mut self, bytes: Bytes, content_type: Option<ContentType>) {
        self.body = Some(SimpleBody {
            bytes,
            content_type,
        });
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Values of every header named `name` (case-insensitive), in insertion order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn body(&self) -> Option<&SimpleBody> {
        self.body.as_ref()
    }

    /// Convert into a hyper-ready request.
    ///
    /// The body's content type, when known, replaces any `Content-Type` header
    /// pair. `user_agent` is added only if the request carries none.
    #[must_use]
    pub fn into_http(self, user_agent: Option<&HeaderValue>) -> http::Request<Full<Bytes>> {
        let (bytes, content_type) = match self.body {
            Some(body) => (body.bytes, body.content_type),
            None => (Bytes::new(), None),
        };

        let mut request = http::Request::new(Full::new(bytes));
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;

        let headers = request.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, content_type.header);
        }
        if let Some(user_agent) = user_agent
            && !headers.contains_key(USER_AGENT)
        {
            headers.insert(USER_AGENT, user_agent.clone());
        }
        request
    }
}

/// Engine version string understood by `ProtocolVersion::from_str`.
///
/// Versions the core model does not know map to strings it rejects.
#[must_use]
pub fn version_format(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/?",
    }
}

/// Reason phrase as received on the wire, or the canonical one for the status.
#[must_use]
pub fn reason_phrase<B>(response: &http::Response<B>) -> Option<String> {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .or_else(|| response.status().canonical_reason())
        .map(str::to_owned)
}

/// URI without query string or fragment, safe for logs and spans.
#[must_use]
pub fn loggable_uri(uri: &Uri) -> String {
    let scheme = uri.scheme_str().unwrap_or("http");
    let authority = uri.authority().map_or("", |a| a.as_str());
    format!("{scheme}://{authority}{}", uri.path())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_charset() {
        let ct = ContentType::parse("text/plain; charset=ISO-8859-1").unwrap();
        assert!(ct.charset().unwrap().eq_ignore_ascii_case("iso-8859-1"));

        let plain = ContentType::parse("application/json").unwrap();
        assert_eq!(plain.charset(), None);
        let with = plain.with_charset("UTF-8").unwrap();
        assert!(with.charset().unwrap().eq_ignore_ascii_case("utf-8"));
        assert_eq!(with.mime().essence_str(), "application/json");
    }

    #[test]
    fn test_content_type_invalid() {
        let err = ContentType::parse("not a media type").unwrap_err();
        assert!(matches!(err, HttpError::InvalidContentType { ref value, .. } if value == "not a media type"));
    }

    #[test]
    fn test_into_http_replaces_content_type_and_adds_user_agent() {
        let mut request = SimpleRequest::new(Method::POST, "http://localhost/a".parse().unwrap());
        request.add_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        request.add_header(
            HeaderName::from_static("x-tag"),
            HeaderValue::from_static("1"),
        );
        request.add_header(
            HeaderName::from_static("x-tag"),
            HeaderValue::from_static("2"),
        );
        let ct = ContentType::parse("text/plain; charset=UTF-8").unwrap();
        request.set_body(Bytes::from_static(b"hi"), Some(ct));

        let ua = HeaderValue::from_static("courier-test");
        let http = request.into_http(Some(&ua));

        let content_types: Vec<_> = http.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(content_types.len(), 1);
        assert!(content_types[0].to_str().unwrap().starts_with("text/plain; charset="));
        assert_eq!(http.headers().get_all("x-tag").iter().count(), 2);
        assert_eq!(http.headers()[USER_AGENT], "courier-test");
    }

    #[test]
    fn test_into_http_keeps_caller_user_agent() {
        let mut request = SimpleRequest::new(Method::GET, "http://localhost/".parse().unwrap());
        request.add_header(USER_AGENT, HeaderValue::from_static("mine/1.0"));

        let http = request.into_http(Some(&HeaderValue::from_static("default")));
        assert_eq!(http.headers()[USER_AGENT], "mine/1.0");
    }

    #[test]
    fn test_version_format() {
        assert_eq!(version_format(Version::HTTP_10), "HTTP/1.0");
        assert_eq!(version_format(Version::HTTP_11), "HTTP/1.1");
        assert_eq!(version_format(Version::HTTP_2), "HTTP/2.0");
        assert_eq!(version_format(Version::HTTP_3), "HTTP/3.0");
    }

    #[test]
    fn test_reason_phrase_falls_back_to_canonical() {
        let response = http::Response::builder().status(404).body(()).unwrap();
        assert_eq!(reason_phrase(&response).as_deref(), Some("Not Found"));
    }

    #[test]
    fn test_loggable_uri_drops_query() {
        let uri: Uri = "https://api.example.com:8443/v1/items?token=secret#frag".parse().unwrap();
        assert_eq!(loggable_uri(&uri), "https://api.example.com:8443/v1/items");
    }
}
