//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (connect deadline, total request deadline)
//!     → On failure: reported once, never retried
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: callers retry on their own

pub mod timeouts;

pub use timeouts::build_upstream_client;
