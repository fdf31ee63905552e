//! Translation of engine responses into core responses.

use crate::native::{SimpleResponse, reason_phrase, version_format};
use courier_core::{HeaderMultimap, HttpError, ProtocolVersion, Request, Response};
use std::sync::Arc;

/// Build a core [`Response`] from an engine response.
///
/// Header values keep their arrival order, repeated names included. Value
/// bytes are decoded as ISO-8859-1, one character per byte, so non-ASCII
/// bytes survive unchanged. An empty body is reported as no body.
///
/// # Errors
/// Returns `HttpError::UnsupportedProtocolVersion` if the engine negotiated a
/// version the core model has no counterpart for.
pub fn to_response(response: SimpleResponse, request: Arc<Request>) -> Result<Response, HttpError> {
    let protocol_version: ProtocolVersion = version_format(response.version()).parse()?;
    let reason = reason_phrase(&response);

    let mut headers = HeaderMultimap::new();
    for (name, value) in response.headers() {
        headers.append(name.as_str(), latin1(value.as_bytes()));
    }

    let (parts, body) = response.into_parts();
    let mut builder = Response::builder(parts.status.as_u16(), request)
        .protocol_version(protocol_version)
        .headers(headers);
    if let Some(reason) = reason {
        builder = builder.reason(reason);
    }
    if !body.is_empty() {
        builder = builder.body(body);
    }
    Ok(builder.build())
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}
