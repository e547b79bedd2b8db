//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared, immutable proxy state from configuration
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Serve on a listener until shutdown is signalled

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::ProxyConfig;
use crate::http::client::UpstreamClient;
use crate::http::handler::proxy_handler;
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::routing::{rewrite_matcher, AndMatcher, TargetResolver};
use crate::security::{CorsPolicy, OriginAllowList};

/// Error type for building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid upstream base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("Invalid version header: {0}")]
    VersionHeader(String),

    #[error("Failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<ProxyConfig>,
    pub resolver: Arc<TargetResolver>,
    pub rewrite: Arc<AndMatcher>,
    pub cors: Arc<CorsPolicy>,
    pub origins: Arc<OriginAllowList>,
    pub client: UpstreamClient,
    pub version_header: HeaderName,
    pub api_version: HeaderValue,
}

impl ProxyState {
    /// Build state from a validated configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let base = Url::parse(&config.upstream.base_url)?;
        let resolver = TargetResolver::new(base, config.routing.addressing);

        let version_header = HeaderName::from_bytes(config.upstream.version_header.as_bytes())
            .map_err(|e| ServerError::VersionHeader(e.to_string()))?;
        let api_version = HeaderValue::from_str(&config.upstream.api_version)
            .map_err(|e| ServerError::VersionHeader(e.to_string()))?;

        let client = UpstreamClient::new(Duration::from_secs(config.upstream.timeout_secs))?;

        Ok(Self {
            resolver: Arc::new(resolver),
            rewrite: Arc::new(rewrite_matcher(&config.rewrite)),
            cors: Arc::new(CorsPolicy::from_config(&config.cors, &config.upstream.version_header)),
            origins: Arc::new(OriginAllowList::new(&config.cors.allowed_origins)),
            client,
            version_header,
            api_version,
            config: Arc::new(config),
        })
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = ProxyState::new(config)?;
        let config = state.config.clone();
        let router = build_router(state);
        Ok(Self { router, config })
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

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

/// Build the Axum router with all middleware layers.
pub fn build_router(state: ProxyState) -> Router {
    let cors = state.cors.clone();
    let expose_panic = state.config.debug.expose_error_chain;

    Router::new()
        .fallback(proxy_handler)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request_id(request.headers()),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
                    panic_response(&cors, expose_panic, panic)
                })),
        )
}

/// 500 for a panicking handler, still decorated with CORS headers.
fn panic_response(cors: &CorsPolicy, expose: bool, panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()));

    tracing::error!(panic = ?message, "Handler panicked");

    let mut body = json!({ "error": "Internal server error" });
    if let (true, Some(message)) = (expose, message) {
        body["details"] = message.into();
    }

    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    cors.apply(response.headers_mut());
    response
}
