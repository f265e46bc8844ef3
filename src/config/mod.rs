//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process arguments
//!     → args.rs (clap parse, numeric checks)
//!     → loader.rs (map onto typed config)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to startup, cloned into subsystems
//! ```
//!
//! # Design Decisions
//! - Arguments are the only configuration source; there are no config files
//!   and no environment variables for the relay itself
//! - All fields have defaults so `imgproxy` with no flags starts on 80/443
//! - Validation separates syntactic (clap) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::{load_config, ConfigError};
pub use schema::{LimitsConfig, ListenerConfig, ProxyConfig, TimeoutConfig};
pub use validation::ValidationError;
