use crate::error::HttpError;
use std::fmt;
use std::str::FromStr;

/// HTTP protocol version of a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    Http10,
    Http11,
    Http2,
}

impl ProtocolVersion {
    /// Canonical format string, e.g. `HTTP/1.1`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolVersion::Http10 => "HTTP/1.0",
            ProtocolVersion::Http11 => "HTTP/1.1",
            ProtocolVersion::Http2 => "HTTP/2.0",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = HttpError;

    /// Parse an engine version string. Unknown versions are an error, never a default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "HTTP/1.0" => Ok(ProtocolVersion::Http10),
            "HTTP/1.1" => Ok(ProtocolVersion::Http11),
            "HTTP/2.0" | "HTTP/2" => Ok(ProtocolVersion::Http2),
            other => Err(HttpError::UnsupportedProtocolVersion(other.to_owned())),
        }
    }
}
