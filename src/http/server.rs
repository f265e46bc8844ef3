//! HTTP server setup and the relay handler.
//!
//! # Responsibilities
//! - Create the Axum Router with the relay handler
//! - Wire up middleware (tracing)
//! - Serve the same router on the plaintext and TLS listeners
//! - Validate, fetch and relay each request
//! - Classify failures into 404 / 413 / 500

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::request::{build_outbound, RelayContext};
use crate::http::response::relay_response;
use crate::net::{DualListener, Protocol};
use crate::resilience::build_upstream_client;
use crate::routing::{self, RejectReason};
use crate::security::limits::{format_bytes, ResponseLimit};

/// Error type for server construction and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("version {0:?} is not a valid header value")]
    Version(String),

    #[error("{proto} server failed: {source}")]
    Serve {
        proto: Protocol,
        #[source]
        source: std::io::Error,
    },

    #[error("{proto} server task panicked")]
    Panicked { proto: Protocol },
}

/// Why a relay ended without forwarding the upstream response.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    Rejected(#[from] RejectReason),

    #[error("Error forming HTTP request for {url}: {source}")]
    BuildRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Network error performing request for {url}: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid request: response too large {declared} bytes from {url}")]
    TooLarge { url: String, declared: u64 },
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Rejected(_) => StatusCode::NOT_FOUND,
            RelayError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::BuildRequest { .. } | RelayError::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client input and oversize problems are warnings; anything that is
    /// our or the upstream's fault is an error.
    fn log(&self, ctx: &RelayContext) {
        match self {
            RelayError::Rejected(reason) => tracing::warn!(
                request_id = %ctx.request_id,
                remote_addr = %ctx.remote_addr,
                method = %ctx.method,
                reason = %reason,
                "Invalid request"
            ),
            RelayError::TooLarge { url, declared } => tracing::warn!(
                request_id = %ctx.request_id,
                remote_addr = %ctx.remote_addr,
                url = %url,
                length_b = declared,
                length = %format_bytes(*declared),
                "Invalid request: response too large"
            ),
            RelayError::BuildRequest { url, source } => tracing::error!(
                request_id = %ctx.request_id,
                url = %url,
                error = %source,
                "Error forming HTTP request"
            ),
            RelayError::Upstream { url, source } => tracing::error!(
                request_id = %ctx.request_id,
                url = %url,
                error = %source,
                "Network error performing request"
            ),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub limit: ResponseLimit,
    pub version: HeaderValue,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// `version` is stamped on every relayed response.
    pub fn new(config: ProxyConfig, version: &str) -> Result<Self, ServerError> {
        let client = build_upstream_client(&config.timeouts).map_err(ServerError::Client)?;
        let version = HeaderValue::from_str(version)
            .map_err(|_| ServerError::Version(version.to_string()))?;

        let state = AppState {
            client,
            limit: ResponseLimit::new(config.limits.max_response_bytes),
            version,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving on custom transports.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve both listeners until shutdown is signalled or one of them fails.
    pub async fn run(
        self,
        listeners: DualListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let grace = self.config.timeouts.shutdown_grace();
        let (http_listener, https_listener) = listeners.into_parts();
        let http_handle = Handle::new();
        let https_handle = Handle::new();

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        tracing::info!("HTTP server starting");

        let http = axum_server::from_tcp(http_listener)
            .handle(http_handle.clone())
            .serve(app.clone());
        let https = axum_server::from_tcp_rustls(https_listener, tls)
            .handle(https_handle.clone())
            .serve(app);

        let mut http_task = tokio::spawn(http);
        let mut https_task = tokio::spawn(https);

        let first = tokio::select! {
            _ = shutdown.recv() => Finished::Shutdown,
            res = &mut http_task => Finished::Http(res),
            res = &mut https_task => Finished::Https(res),
        };

        // Whichever ends first, the other one is stopped too.
        http_handle.graceful_shutdown(Some(grace));
        https_handle.graceful_shutdown(Some(grace));

        let (http_res, https_res) = match first {
            Finished::Shutdown => {
                tracing::info!("Shutdown signal received");
                (
                    join(Protocol::Http, http_task).await,
                    join(Protocol::Https, https_task).await,
                )
            }
            Finished::Http(res) => (
                flatten(Protocol::Http, res),
                join(Protocol::Https, https_task).await,
            ),
            Finished::Https(res) => (
                join(Protocol::Http, http_task).await,
                flatten(Protocol::Https, res),
            ),
        };

        http_res?;
        https_res?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

type ServeResult = Result<std::io::Result<()>, tokio::task::JoinError>;

/// First event observed by the serving loop.
enum Finished {
    Shutdown,
    Http(ServeResult),
    Https(ServeResult),
}

async fn join(
    proto: Protocol,
    task: JoinHandle<std::io::Result<()>>,
) -> Result<(), ServerError> {
    flatten(proto, task.await)
}

fn flatten(proto: Protocol, res: ServeResult) -> Result<(), ServerError> {
    match res {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(ServerError::Serve { proto, source }),
        Err(_) => Err(ServerError::Panicked { proto }),
    }
}

/// Relay handler shared by both listeners.
async fn relay_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let ctx = RelayContext::new(remote_addr, request.method().clone());

    match relay(&state, &ctx, request).await {
        Ok(response) => response,
        Err(err) => {
            err.log(&ctx);
            err.into_response()
        }
    }
}

async fn relay(
    state: &AppState,
    ctx: &RelayContext,
    request: Request<Body>,
) -> Result<Response, RelayError> {
    let (parts, _body) = request.into_parts();

    // 1. Resolve target (method, path, base64, URL, scheme)
    let target = routing::resolve(&parts.method, parts.uri.path())?;

    tracing::debug!(
        request_id = %ctx.request_id,
        method = %ctx.method,
        url = %target,
        host = %target.authority(),
        "Proxying request"
    );

    // 2. Build outbound request
    let outbound =
        build_outbound(&state.client, &parts, &target).map_err(|source| {
            RelayError::BuildRequest {
                url: target.to_string(),
                source,
            }
        })?;

    // 3. Fetch
    let upstream = state
        .client
        .execute(outbound)
        .await
        .map_err(|source| RelayError::Upstream {
            url: target.to_string(),
            source,
        })?;

    // 4. Declared size guard
    if let Err(declared) = state.limit.check_declared(upstream.headers()) {
        return Err(RelayError::TooLarge {
            url: target.to_string(),
            declared,
        });
    }

    // 5. Relay
    Ok(relay_response(
        upstream,
        ctx.clone(),
        target,
        &state.version,
        state.limit,
    ))
}
