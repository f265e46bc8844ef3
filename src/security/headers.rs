//! Header manipulation between the inbound and upstream hops.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Drop the inbound `Host` so the upstream sees the target authority
//! - Copy every other header with all of its values
//!
//! # Design Decisions
//! - Framing headers belong to one connection; each side re-frames the body
//! - Headers listed in `Connection` are hop-by-hop as well (RFC 9110 §7.6.1)

use axum::http::header::{self, HeaderMap, HeaderName};

/// Headers that only apply to a single connection.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Response header carrying the relay version.
pub const X_IMGPROXY_VERSION: HeaderName = HeaderName::from_static("x-imgproxy-version");

fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect()
}

fn copy_end_to_end(source: &HeaderMap, skip: &[HeaderName]) -> HeaderMap {
    let listed = connection_listed(source);
    let mut out = HeaderMap::with_capacity(source.len());

    for (name, value) in source.iter() {
        if HOP_BY_HOP.contains(name) || listed.contains(name) || skip.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Headers to send upstream, derived from the inbound request.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    copy_end_to_end(inbound, &[header::HOST])
}

/// Headers to send to the caller, derived from the upstream response.
pub fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    copy_end_to_end(upstream, &[])
}
