//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → headers.rs (drop Host and hop-by-hop headers)
//!     → forwarded upstream
//!
//! Upstream response:
//!     → limits.rs (declared length ceiling → 413)
//!     → headers.rs (drop hop-by-hop headers)
//!     → limits.rs (streamed byte ceiling)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Fail closed: an oversized response is never partially forwarded when
//!   the size is known up front
//! - No trust in client input

pub mod headers;
pub mod limits;

pub use limits::ResponseLimit;
