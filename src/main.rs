//! imgproxy
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!                       │                   IMGPROXY                    │
//!   GET /{b64url}.png   │  ┌──────────┐   ┌─────────┐   ┌───────────┐   │
//!  ─────────────────────┼─▶│ net      │──▶│ http    │──▶│ routing   │   │
//!    :80 plain          │  │ listener │   │ server  │   │ decode +  │   │
//!    :443 TLS (ephem.)  │  └──────────┘   └─────────┘   │ validate  │   │
//!                       │                               └─────┬─────┘   │
//!                       │                                     ▼         │
//!   streamed response   │  ┌──────────┐   ┌─────────┐   ┌───────────┐   │
//!  ◀────────────────────┼──│ response │◀──│ limits  │◀──│ upstream  │◀──┼── target
//!                       │  │ + version│   │ 413 /cap│   │ client    │   │
//!                       │  └──────────┘   └─────────┘   └───────────┘   │
//!                       └───────────────────────────────────────────────┘
//! ```

use clap::Parser;

use imgproxy::config::{load_config, Args};
use imgproxy::lifecycle::{self, signals, Shutdown};
use imgproxy::observability::logging;
use imgproxy::{encode_target, VERSION};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Utility mode: no logging, no listeners.
    if let Some(value) = args.encode.as_deref() {
        println!("{}", encode_target(value));
        return;
    }

    logging::init();

    tracing::info!(version = VERSION, "imgproxy starting");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        http_address = %config.listener.http_addr(),
        https_address = %config.listener.https_addr(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        max_response_bytes = config.limits.max_response_bytes,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let _signals = signals::spawn_signal_listener(&shutdown);

    if let Err(e) = lifecycle::start(config, VERSION, &shutdown).await {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
