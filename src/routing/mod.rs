//! Target resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound method + path
//!     → target.rs (method/path policy)
//!     → encoding.rs (strip cosmetic extension, base64url decode)
//!     → target.rs (URL parse, scheme policy)
//!     → Target (absolute http/https URL to fetch)
//! ```
//!
//! # Design Decisions
//! - Every rejection carries its reason for server-side logs, but callers
//!   only ever see an opaque 404
//! - Only `http` and `https` targets are ever produced

pub mod encoding;
pub mod target;

pub use encoding::{decode_segment, encode_target};
pub use target::{resolve, RejectReason, Target};
