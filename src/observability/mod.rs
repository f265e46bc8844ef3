//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (subscriber, filter, formatting)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every line logged for one relay
//! - The subscriber is installed once by the binary; the library only emits

pub mod logging;
