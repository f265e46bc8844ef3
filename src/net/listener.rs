//! Dual listener bootstrap.
//!
//! # Responsibilities
//! - Bind the plaintext and TLS ports on the configured interface
//! - Fail the whole bootstrap if either bind fails
//! - Hand both sockets to the HTTP server as non-blocking std listeners

use std::net::{SocketAddr, TcpListener};

use crate::config::ListenerConfig;

/// Which side of the relay a listener serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => f.write_str("HTTP"),
            Protocol::Https => f.write_str("HTTPS"),
        }
    }
}

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Failed to bind {proto} listener on {address}: {source}")]
    Bind {
        proto: Protocol,
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// The plaintext and TLS sockets, both bound and ready to accept.
#[derive(Debug)]
pub struct DualListener {
    http: TcpListener,
    https: TcpListener,
}

impl DualListener {
    /// Bind both listeners. Both succeed or neither is kept open.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let https = bind_one(Protocol::Https, config.https_addr())?;
        // `https` is dropped (closed) if this fails.
        let http = bind_one(Protocol::Http, config.http_addr())?;
        Ok(Self { http, https })
    }

    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    pub fn https_addr(&self) -> std::io::Result<SocketAddr> {
        self.https.local_addr()
    }

    pub fn into_parts(self) -> (TcpListener, TcpListener) {
        (self.http, self.https)
    }
}

fn bind_one(proto: Protocol, address: SocketAddr) -> Result<TcpListener, ListenerError> {
    let wrap = |source| ListenerError::Bind {
        proto,
        address,
        source,
    };

    let listener = TcpListener::bind(address).map_err(wrap)?;
    listener.set_nonblocking(true).map_err(wrap)?;
    let local_addr = listener.local_addr().map_err(wrap)?;

    tracing::info!(proto = %proto, address = %local_addr, "Listen");
    Ok(listener)
}
