//! imgproxy: a minimal forwarding relay.
//!
//! Requests for `/{base64url(target)}[.ext]` are fetched from `target` and
//! streamed back to the caller, on one plaintext and one TLS listener.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::encode_target;

/// Version stamped into `X-Imgproxy-Version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
