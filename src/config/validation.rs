//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Validate value ranges (timeouts > 0, size ceiling > 0)
//! - Detect listeners that would collide on the same port
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ProxyConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("http and https listeners both configured on port {0}")]
    PortConflict(u16),
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    // Port 0 asks the OS for an ephemeral port, so two zeros never collide.
    if listener.http_port != 0 && listener.http_port == listener.https_port {
        errors.push(ValidationError::PortConflict(listener.http_port));
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "upstream_timeout_secs",
        });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "connect_timeout_secs",
        });
    }
    if config.limits.max_response_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "max_response_bytes",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
