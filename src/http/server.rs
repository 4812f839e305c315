//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, security headers)
//! - Own the shared vision client (connection pool reused across requests)
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::analysis::VisionClient;
use crate::config::ServiceConfig;
use crate::http::handlers::{analyze_upload, analyze_url, health, list_features, not_found};
use crate::http::request::X_REQUEST_ID;
use crate::security::{limits, with_security_headers};

/// Application state injected into handlers.
///
/// Holds no request-scoped or mutable data; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub client: VisionClient,
    pub request_id_header: Arc<str>,
}

/// HTTP server for the vision proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self, reqwest::Error> {
        let client = VisionClient::new(&config.upstream)?;
        let state = AppState {
            client,
            request_id_header: Arc::from(config.upstream.request_id_header.as_str()),
        };

        let router = Self::build_router(state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No inbound timeout layer: the forwarder's deadline is the only request timeout.
    fn build_router(state: AppState) -> Router {
        let api = Router::new()
            .route(
                "/api/v1/analyze/url",
                post(analyze_url).layer(limits::url_body_limit()),
            )
            .route(
                "/api/v1/analyze/upload",
                post(analyze_upload).layer(limits::upload_body_limit()),
            )
            .route("/api/v1/analyze/features", get(list_features))
            .route("/health", get(health))
            .fallback(not_found)
            .with_state(state);

        with_security_headers(api).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// The configured router, for serving on a custom listener or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
