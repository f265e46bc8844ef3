//! Timeout enforcement for upstream fetches.
//!
//! # Responsibilities
//! - Build the shared upstream client with explicit deadlines
//! - Enforce connect timeout and total request timeout
//!
//! # Design Decisions
//! - The total timeout also covers the streamed body, so a stalled upstream
//!   cannot pin a relay forever
//! - Timed-out requests surface as upstream failures (500), same as any
//!   other network error
//! - Redirects follow the client default policy (up to 10 hops)

use reqwest::Client;

use crate::config::TimeoutConfig;

/// Build the HTTP client used for every outbound fetch.
///
/// The client pools connections internally; no other state is shared
/// between relays.
pub fn build_upstream_client(config: &TimeoutConfig) -> reqwest::Result<Client> {
    tracing::debug!(
        connect_timeout_secs = config.connect_secs,
        upstream_timeout_secs = config.upstream_secs,
        "Building upstream client"
    );

    Client::builder()
        .connect_timeout(config.connect())
        .timeout(config.upstream())
        .build()
}
