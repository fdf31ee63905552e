//! Translation of core requests into engine-native requests.

use crate::native::{ContentType, SimpleRequest};
use bytes::Bytes;
use courier_core::{HttpError, Options, Request};
use flate2::Compression;
use flate2::write::GzEncoder;
use http::Uri;
use http::header::{ACCEPT, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HeaderName, HeaderValue};
use std::io::Write;

const ENCODING_GZIP: &str = "gzip";
const ENCODING_DEFLATE: &str = "deflate";

/// Translate `request` into the engine-native form.
///
/// - `Content-Length` is never copied; the engine frames the body itself.
/// - `Accept: */*` is added when the request has no `Accept` header.
/// - A `Content-Encoding` containing `gzip` compresses the body.
/// - A `Content-Encoding` containing `deflate` is rejected.
/// - The body's content type comes from the first `Content-Type` value, with
///   the request charset appended when the value declares none.
///
/// # Errors
/// Fails synchronously for an invalid URL, header name, header value or
/// content type, and for deflate encoding.
pub fn to_simple_request(request: &Request, options: &Options) -> Result<SimpleRequest, HttpError> {
    let uri = parse_uri(request.url())?;
    let mut simple = SimpleRequest::new(request.method().clone(), uri);

    let mut has_accept = false;
    let mut is_gzip = false;

    for (name, values) in request.headers() {
        if name.eq_ignore_ascii_case(ACCEPT.as_str()) {
            has_accept = true;
        }
        if name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()) {
            continue;
        }
        if name.eq_ignore_ascii_case(CONTENT_ENCODING.as_str()) {
            if has_encoding(values, ENCODING_DEFLATE) {
                return Err(HttpError::UnsupportedEncoding("Deflate".to_owned()));
            }
            is_gzip = has_encoding(values, ENCODING_GZIP);
        }

        let header_name = HeaderName::from_bytes(name.as_bytes())?;
        for value in values {
            simple.add_header(header_name.clone(), HeaderValue::from_str(value)?);
        }
    }

    if !has_accept {
        simple.add_header(ACCEPT, HeaderValue::from_static("*/*"));
    }

    if let Some(body) = request.body() {
        let bytes = if is_gzip && !body.is_empty() {
            gzip(body).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "gzip compression failed; sending body uncompressed");
                body.clone()
            })
        } else {
            body.clone()
        };
        simple.set_body(bytes, body_content_type(request)?);
    }

    tracing::trace!(
        method = %simple.method(),
        follow_redirects = options.is_follow_redirects(),
        gzip = is_gzip,
        "translated request"
    );
    Ok(simple)
}

/// Parse an absolute `http`/`https` URL.
fn parse_uri(url: &str) -> Result<Uri, HttpError> {
    let invalid = |reason: &str| HttpError::InvalidUri {
        url: url.to_owned(),
        reason: reason.to_owned(),
    };
    let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;
    match uri.scheme_str() {
        Some("http" | "https") => {}
        Some(_) => return Err(invalid("unsupported scheme")),
        None => return Err(invalid("URL must be absolute")),
    }
    if uri.authority().is_none() {
        return Err(invalid("URL has no host"));
    }
    Ok(uri)
}

/// Whether any value, or any element of a comma-separated value, names `coding`.
fn has_encoding(values: &[String], coding: &str) -> bool {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case(coding))
}

fn body_content_type(request: &Request) -> Result<Option<ContentType>, HttpError> {
    let Some(value) = request
        .headers()
        .get(CONTENT_TYPE.as_str())
        .and_then(|values| values.iter().find(|v| !v.trim().is_empty()))
    else {
        return Ok(None);
    };

    let content_type = ContentType::parse(value)?;
    match (content_type.charset(), request.charset()) {
        (None, Some(charset)) => content_type.with_charset(charset).map(Some),
        _ => Ok(Some(content_type)),
    }
}

fn gzip(data: &[u8]) -> std::io::Result<Bytes> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(Bytes::from(encoder.finish()?))
}
