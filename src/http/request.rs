//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a request ID for log correlation
//! - Turn the validated inbound request into the outbound one
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, never sent upstream
//!   or back to the caller
//! - The outbound request reuses the inbound method and end-to-end headers;
//!   the client writes `Host` from the target URL

use std::net::SocketAddr;

use axum::http::{request::Parts, Method};
use uuid::Uuid;

use crate::routing::Target;
use crate::security::headers::outbound_headers;

/// Per-request identity shared by every log line of one relay.
#[derive(Debug, Clone)]
pub struct RelayContext {
    pub request_id: Uuid,
    pub remote_addr: SocketAddr,
    pub method: Method,
}

impl RelayContext {
    pub fn new(remote_addr: SocketAddr, method: Method) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            remote_addr,
            method,
        }
    }
}

/// Build the upstream request for `target` from the inbound request parts.
pub fn build_outbound(
    client: &reqwest::Client,
    parts: &Parts,
    target: &Target,
) -> reqwest::Result<reqwest::Request> {
    client
        .request(parts.method.clone(), target.url().clone())
        .headers(outbound_headers(&parts.headers))
        .build()
}
