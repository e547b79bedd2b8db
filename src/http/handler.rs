//! The proxy handler.
//!
//! # Request Flow
//! ```text
//! request
//!     → origin allow-list      (403, no CORS)
//!     → OPTIONS                (200 preflight)
//!     → method check           (405)
//!     → target resolution      (302 redirect / banner / upstream target)
//!     → body read + rewrite    (page requests; 400 on bad input)
//!     → outbound headers       (version header injected)
//!     → upstream call          (500 on timeout or failure)
//!     → response decoration    (CORS headers on everything above but 403)
//! ```

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Request},
    response::Response,
};

use crate::http::client::UpstreamRequest;
use crate::http::error::ProxyError;
use crate::http::request::{original_url, read_body, request_id};
use crate::http::response;
use crate::http::server::ProxyState;
use crate::observability::metrics;
use crate::routing::{Matcher, Resolution, Target};
use crate::transform::{outbound_headers, rewrite_page_body, DebugInfo, PageBody};

/// How a request was answered, for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Preflight,
    Redirect,
    Banner,
    Forwarded,
    Rejected,
    Error,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Preflight => "preflight",
            Outcome::Redirect => "redirect",
            Outcome::Banner => "banner",
            Outcome::Forwarded => "forwarded",
            Outcome::Rejected => "rejected",
            Outcome::Error => "error",
        }
    }
}

/// Axum entry point.
pub async fn proxy_handler(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    handle(&state, request).await
}

/// Run one request through the proxy. Never fails: every error becomes a
/// well-formed response.
pub async fn handle(state: &ProxyState, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(request.headers()).to_string();

    if !state.origins.permits(request.headers()) {
        tracing::warn!(
            request_id = %request_id,
            origin = ?request.headers().get(header::ORIGIN),
            "Origin not allowed"
        );
        let response = response::origin_rejected();
        metrics::record_request(
            method.as_str(),
            response.status().as_u16(),
            Outcome::Rejected.as_str(),
            start,
        );
        return response;
    }

    let (mut response, outcome) = match dispatch(state, request, &request_id).await {
        Ok(dispatched) => dispatched,
        Err(err) => {
            if err.status().is_server_error() {
                tracing::error!(request_id = %request_id, error = %err, "Request failed");
            } else {
                tracing::warn!(request_id = %request_id, error = %err, "Request rejected");
            }
            (err.to_response(state.config.debug.expose_error_chain), Outcome::Error)
        }
    };

    state.cors.apply(response.headers_mut());

    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        outcome.as_str(),
        start,
    );
    response
}

async fn dispatch(
    state: &ProxyState,
    request: Request<Body>,
    request_id: &str,
) -> Result<(Response, Outcome), ProxyError> {
    let method = request.method().clone();

    if method == Method::OPTIONS {
        return Ok((response::preflight(state.cors.preflight_headers()), Outcome::Preflight));
    }

    if !state.cors.allows_method(&method) {
        return Err(ProxyError::MethodNotAllowed);
    }

    let target = match state.resolver.resolve(&method, request.uri()) {
        Resolution::Forward(target) => target,
        Resolution::Redirect(location) => {
            tracing::debug!(request_id = %request_id, location = %location, "Redirecting");
            return Ok((response::redirect(&location), Outcome::Redirect));
        }
        Resolution::Banner => {
            let upstream = &state.config.upstream;
            let banner = response::banner(
                state.resolver.base(),
                &upstream.version_header,
                &upstream.api_version,
            );
            return Ok((banner, Outcome::Banner));
        }
    };

    let (parts, body) = request.into_parts();

    let body = if method == Method::POST || method == Method::PATCH {
        let bytes = read_body(body, state.config.limits.max_body_bytes).await?;
        prepare_body(state, &method, &target, bytes, request_id)?
    } else {
        None
    };

    let headers = outbound_headers(&parts.headers, &state.version_header, &state.api_version);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        target = %target,
        "Forwarding request"
    );

    let upstream = state
        .client
        .send(UpstreamRequest {
            method,
            url: target.url().clone(),
            headers,
            body,
        })
        .await?;

    tracing::debug!(request_id = %request_id, status = %upstream.status, "Upstream responded");

    let debug_config = &state.config.debug;
    let debug = debug_config.inject_metadata.then(|| {
        (
            debug_config.marker.as_str(),
            DebugInfo {
                original_url: original_url(&parts),
                processed_url: target.url().to_string(),
                notion_path: target.path().to_string(),
            },
        )
    });

    Ok((response::from_upstream(upstream, debug), Outcome::Forwarded))
}

/// Body to forward for a POST/PATCH, rewriting page requests.
fn prepare_body(
    state: &ProxyState,
    method: &Method,
    target: &Target,
    bytes: Bytes,
    request_id: &str,
) -> Result<Option<Bytes>, ProxyError> {
    let rewrite = &state.config.rewrite;
    if !rewrite.enabled || !state.rewrite.matches(method, target.path()) {
        return Ok((!bytes.is_empty()).then_some(bytes));
    }

    let page =
        rewrite_page_body(rewrite, &bytes).inspect_err(|_| metrics::record_rewrite("rejected"))?;

    match page {
        PageBody::Empty => Ok(None),
        PageBody::Raw => {
            metrics::record_rewrite("passthrough");
            Ok(Some(bytes))
        }
        PageBody::Json(value) => {
            metrics::record_rewrite("passthrough");
            Ok(Some(Bytes::from(serde_json::to_vec(&value)?)))
        }
        PageBody::Rewritten(value) => {
            metrics::record_rewrite("rewritten");
            tracing::debug!(request_id = %request_id, field = %rewrite.field, "Rewrote page body");
            Ok(Some(Bytes::from(serde_json::to_vec(&value)?)))
        }
    }
}
