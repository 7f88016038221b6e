//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that serves rewritten requests
//! - Wire up middleware (rewrite, timeout, tracing)
//! - Bind server to listener with graceful shutdown
//!
//! # Layering
//! ```text
//! RewriteService            (rules applied before routing)
//!   └─ Router
//!        ├─ TraceLayer
//!        ├─ TimeoutLayer
//!        └─ fallback: ServeDir(root) | echo handler
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    Json, Router, ServiceExt,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RewriteConfig;
use crate::http::middleware::{RewriteLayer, RewriteService, RewrittenFrom};
use crate::lifecycle::Shutdown;
use crate::rules::RuleStore;

/// HTTP server fronting the rewrite rules.
pub struct HttpServer {
    router: Router,
    config: RewriteConfig,
    store: Arc<RuleStore>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and rule store.
    pub fn new(config: RewriteConfig, store: Arc<RuleStore>) -> Self {
        let router = Self::build_router(&config);
        Self {
            router,
            config,
            store,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RewriteConfig) -> Router {
        let router = match &config.server.root {
            Some(root) => Router::new().fallback_service(ServeDir::new(root)),
            None => Router::new().fallback(echo_handler),
        };

        router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The router wrapped in the rewrite middleware.
    pub fn app(&self) -> RewriteService<Router> {
        RewriteLayer::new(self.store.clone()).layer(self.router.clone())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.store.len(),
            "HTTP server starting"
        );

        let mut shutdown_rx = shutdown.subscribe();
        let app = self.app();

        axum::serve(listener, ServiceExt::<Request<Body>>::into_make_service(app))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }
}

/// Body returned by the echo handler.
#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten_from: Option<String>,
}

/// Reports what the downstream handler received.
async fn echo_handler(request: Request<Body>) -> Json<EchoResponse> {
    let rewritten_from = request
        .extensions()
        .get::<RewrittenFrom>()
        .map(|RewrittenFrom(uri)| uri.to_string());

    Json(EchoResponse {
        method: request.method().to_string(),
        url: request.uri().to_string(),
        rewritten_from,
    })
}
