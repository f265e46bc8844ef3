//! Request → target URL resolution.
//!
//! # Responsibilities
//! - Accept only `GET` and `HEAD`
//! - Refuse the index path
//! - Decode the embedded URL and allow only `http`/`https` targets

use std::fmt;

use axum::http::Method;
use url::Url;

use crate::routing::encoding::decode_segment;

/// Why an inbound request was refused.
///
/// Used for server-side logging only; every variant maps to the same
/// opaque 404 for the caller.
#[derive(Debug, thiserror::Error)]
pub enum RejectReason {
    #[error("unsupported method {0}")]
    UnsupportedMethod(Method),

    #[error("ignore index")]
    IndexPath,

    #[error("invalid base64 encoded data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("decoded target is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid base64 encoded URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported url scheme {0}")]
    UnsupportedScheme(String),

    #[error("target URL has no host")]
    MissingHost,
}

/// An absolute `http` or `https` URL the relay is allowed to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
}

impl Target {
    /// Parse decoded bytes as a target URL and apply the scheme policy.
    ///
    /// The URL is kept in WHATWG-normalised form (dot segments resolved,
    /// default port dropped, empty path becomes `/`). The upstream client
    /// would apply the same normalisation when sending.
    pub fn parse(bytes: &[u8]) -> Result<Self, RejectReason> {
        let raw = std::str::from_utf8(bytes).map_err(|_| RejectReason::InvalidUtf8)?;
        let url = Url::parse(raw)?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(RejectReason::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().is_none() {
            return Err(RejectReason::MissingHost);
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The `Host` header value the upstream should see: host plus any
    /// non-default port.
    pub fn authority(&self) -> String {
        // host_str is always Some here, checked in `parse`.
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Run the full inbound validation pipeline for one request.
pub fn resolve(method: &Method, path: &str) -> Result<Target, RejectReason> {
    if method != Method::GET && method != Method::HEAD {
        return Err(RejectReason::UnsupportedMethod(method.clone()));
    }
    if path == "/" {
        return Err(RejectReason::IndexPath);
    }

    let bytes = decode_segment(path)?;
    Target::parse(&bytes)
}
