//! Command line arguments.

use std::net::IpAddr;

use clap::Parser;

use crate::config::schema::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT,
    DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_UPSTREAM_TIMEOUT_SECS,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "imgproxy")]
#[command(version, about = "Relay HTTP(S) requests to a base64url-encoded target URL", long_about = None)]
pub struct Args {
    /// Print the URL-safe base64 encoding of STRING and exit
    #[arg(short = 'u', value_name = "STRING")]
    pub encode: Option<String>,

    /// Port for the TLS listener
    #[arg(long, default_value_t = DEFAULT_HTTPS_PORT)]
    pub https_port: u16,

    /// Port for the plaintext listener
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Address both listeners bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub bind_address: IpAddr,

    /// Total deadline for one upstream fetch, body included
    #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout_secs: u64,

    /// Deadline for establishing the upstream connection
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// Largest upstream response body that will be relayed
    #[arg(long, default_value_t = DEFAULT_MAX_RESPONSE_BYTES)]
    pub max_response_bytes: u64,

    /// Time in-flight relays get to finish after a shutdown signal
    #[arg(long, default_value_t = DEFAULT_SHUTDOWN_GRACE_SECS)]
    pub shutdown_grace_secs: u64,
}
