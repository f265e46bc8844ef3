//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → tls.rs (generate ephemeral key pair + self-signed certificate)
//!     → listener.rs (bind HTTP and HTTPS sockets, both or neither)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - The TLS identity lives only in memory and is regenerated every start
//! - Both sockets are bound before either starts serving

pub mod listener;
pub mod tls;

pub use listener::{DualListener, ListenerError, Protocol};
pub use tls::{EphemeralIdentity, IdentityError};
