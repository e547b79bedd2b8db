//! Response construction.
//!
//! # Responsibilities
//! - Turn a buffered upstream response into the caller's response
//! - Build the locally answered responses (preflight, redirect, banner, 403)
//!
//! # Design Decisions
//! - Upstream status and reason phrase are copied verbatim
//! - Upstream bodies pass through byte-for-byte unless debug metadata is merged
//! - CORS headers are applied by the handler, after this module

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::http::client::UpstreamResponse;
use crate::transform::{inject_debug, returnable_response_headers, DebugInfo};

/// Caller response for an upstream response.
///
/// `debug` is `Some((marker, info))` when metadata injection is enabled.
pub fn from_upstream(upstream: UpstreamResponse, debug: Option<(&str, DebugInfo)>) -> Response {
    let mut headers = returnable_response_headers(&upstream.headers);

    let body = match debug.and_then(|(marker, info)| inject_debug(&upstream.body, marker, &info)) {
        Some(annotated) => {
            // the server frames the re-serialized body itself
            headers.remove(header::CONTENT_LENGTH);
            Body::from(annotated)
        }
        None => Body::from(upstream.body),
    };

    let mut response = Response::new(body);
    *response.status_mut() = upstream.status;
    *response.headers_mut() = headers;
    if let Some(reason) = upstream.reason {
        response.extensions_mut().insert(reason);
    }
    response
}

/// 200 with an empty body and the given (preflight) headers.
pub fn preflight(headers: HeaderMap) -> Response {
    (StatusCode::OK, headers).into_response()
}

/// 302 to `location`.
pub fn redirect(location: &Url) -> Response {
    match HeaderValue::from_str(location.as_str()) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        // serialized URLs are always valid header values
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Plain-text usage banner served at `/`.
pub fn banner(base: &Url, version_header: &str, api_version: &str) -> Response {
    let base = base.as_str().trim_end_matches('/');
    let text = format!(
        "notion-cors-proxy\n\
         \n\
         Forwards requests to {base} and adds CORS headers to the response.\n\
         \n\
         Usage:\n  \
         /{base}/v1/<endpoint>      embedded upstream URL\n  \
         /v1/<endpoint>             path on the upstream\n  \
         /redirect/{base}/<path>    302 to the upstream URL\n\
         \n\
         {version_header} defaults to {api_version} when the request does not set it.\n"
    );
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        text,
    )
        .into_response()
}

/// 403 for origins outside the allow-list. Carries no CORS headers.
pub fn origin_rejected() -> Response {
    (StatusCode::FORBIDDEN, "Not allowed").into_response()
}
