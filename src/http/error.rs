//! Proxy error type and its mapping onto HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::transform::RewriteError;

/// Every way a proxied request can fail.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Page body rejected by the rewrite.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Upstream request timed out")]
    UpstreamTimeout,

    #[error("Upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Rewrite(_) => StatusCode::BAD_REQUEST,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::BodyRead(_)
            | ProxyError::Encode(_)
            | ProxyError::UpstreamTimeout
            | ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body: `{"error": ..., "details"?: ...}`.
    ///
    /// Server errors only carry `details` (the source chain) when
    /// `expose_chain` is set.
    pub fn body(&self, expose_chain: bool) -> Value {
        let mut body = json!({ "error": self.to_string() });
        let details = match self {
            ProxyError::Rewrite(e) => e.details(),
            _ if expose_chain && self.status().is_server_error() => source_chain(self),
            _ => None,
        };
        if let Some(details) = details {
            body["details"] = Value::String(details);
        }
        body
    }

    /// Build the response, optionally exposing the source chain.
    pub fn to_response(&self, expose_chain: bool) -> Response {
        let mut response = (self.status(), Json(self.body(expose_chain))).into_response();
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        response
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.to_response(false)
    }
}

/// `source: source: ...` below the top-level error, if any.
fn source_chain(err: &dyn std::error::Error) -> Option<String> {
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        chain.push(source.to_string());
        current = source.source();
    }
    (!chain.is_empty()).then(|| chain.join(": "))
}
