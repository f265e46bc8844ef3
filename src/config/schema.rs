//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTPS_PORT: u16 = 443;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 50 MiB.
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 52_428_800;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Root configuration for the relay.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, ports).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Response size limits.
    pub limits: LimitsConfig,
}

/// Listener configuration for the plaintext and TLS listeners.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Interface both listeners bind to.
    pub bind_address: IpAddr,

    /// Plaintext HTTP port.
    pub http_port: u16,

    /// TLS port.
    pub https_port: u16,
}

impl ListenerConfig {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.http_port)
    }

    pub fn https_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.https_port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream request timeout (headers and body) in seconds.
    pub upstream_secs: u64,

    /// Drain period after a shutdown signal in seconds.
    pub shutdown_grace_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            upstream_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

/// Response size limits.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Largest upstream body relayed, declared or streamed.
    pub max_response_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}
