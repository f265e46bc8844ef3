//! Configuration loading from process arguments.

use crate::config::args::Args;
use crate::config::schema::{LimitsConfig, ListenerConfig, ProxyConfig, TimeoutConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<&Args> for ProxyConfig {
    fn from(args: &Args) -> Self {
        Self {
            listener: ListenerConfig {
                bind_address: args.bind_address,
                http_port: args.http_port,
                https_port: args.https_port,
            },
            timeouts: TimeoutConfig {
                connect_secs: args.connect_timeout_secs,
                upstream_secs: args.upstream_timeout_secs,
                shutdown_grace_secs: args.shutdown_grace_secs,
            },
            limits: LimitsConfig {
                max_response_bytes: args.max_response_bytes,
            },
        }
    }
}

/// Build and validate configuration from parsed arguments.
pub fn load_config(args: &Args) -> Result<ProxyConfig, ConfigError> {
    let config = ProxyConfig::from(args);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
