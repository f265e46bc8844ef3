//! Startup orchestration.
//!
//! # Responsibilities
//! - Generate the ephemeral TLS identity
//! - Bind both listeners
//! - Build the relay server and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use crate::config::ProxyConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::net::{DualListener, EphemeralIdentity, IdentityError, ListenerError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Error generating TLS identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("Error starting listeners: {0}")]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Bring the relay up and serve until `shutdown` fires or a listener fails.
///
/// `version` is stamped on every relayed response.
pub async fn start(
    config: ProxyConfig,
    version: &str,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let identity = EphemeralIdentity::generate()?;
    let tls = identity.rustls_config().await?;

    let listeners = DualListener::bind(&config.listener)?;
    let server = HttpServer::new(config, version)?;

    server.run(listeners, tls, shutdown.subscribe()).await?;
    Ok(())
}
