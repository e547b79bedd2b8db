//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Issue the single outbound call per request
//! - Follow upstream redirects
//! - Enforce the upstream deadline (500 on expiry)
//! - Buffer the upstream response for decoration
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` shared by all requests
//! - No retries: the exchange is all-or-nothing
//! - Non-canonical reason phrases survive via hyper's `ReasonPhrase` extension

use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode},
};
use hyper::ext::ReasonPhrase;
use url::Url;

use crate::http::error::ProxyError;
use crate::observability::metrics;

/// Request as sent to the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Client for the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client with a whole-exchange `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Send `request` and buffer the response.
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(upstream_error)?;

        let status = response.status();
        let reason = response.extensions().get::<ReasonPhrase>().cloned();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(upstream_error)?;

        Ok(UpstreamResponse {
            status,
            reason,
            headers,
            body,
        })
    }
}

fn upstream_error(e: reqwest::Error) -> ProxyError {
    if e.is_timeout() {
        metrics::record_upstream_error("timeout");
        ProxyError::UpstreamTimeout
    } else {
        metrics::record_upstream_error("network");
        ProxyError::Upstream(e)
    }
}
