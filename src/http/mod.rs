//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, relay handler)
//!     → routing (decode + validate target)
//!     → request.rs (request ID, outbound request)
//!     → upstream fetch
//!     → response.rs (copy status/headers, stream body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::RelayContext;
pub use server::{AppState, HttpServer, RelayError, ServerError};
