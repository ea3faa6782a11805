//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with catch-all handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind the server to a listener and serve with graceful shutdown
//! - Dispatch every request into the relay pipeline

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::http::request::RequestIdLayer;
use crate::proxy::transport::{HttpTransport, Transport};
use crate::proxy::Pipeline;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server backed by the production transport.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let transport = Arc::new(HttpTransport::new(&config.timeouts)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a server with an explicit transport. Tests substitute a
    /// recording double here.
    pub fn with_transport(config: RelayConfig, transport: Arc<dyn Transport>) -> Self {
        let pipeline = Arc::new(Pipeline::new(config.proxy.clone(), transport));
        let state = AppState { pipeline };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until
    /// ctrl-c or the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.proxy.prefix,
            mirror = self.config.proxy.mirror,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = shutdown.recv() => {}
                }
                tracing::info!("shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Main relay handler: every method, every path.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.pipeline.handle(request).await
}
