//! Header construction for forwarded requests and returned responses.
//!
//! All functions here take the caller's map by reference and return a new
//! one. Lookups go through `HeaderMap`, which compares names
//! case-insensitively.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

/// Hop-by-hop headers (RFC 9110 §7.6.1) plus the legacy `proxy-connection`.
const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Copy `headers`, adding `name: default` when no `name` header is present.
///
/// An inbound value wins. If the inbound request repeats the header, only
/// the first value is kept so the upstream sees it exactly once.
pub fn with_api_version(headers: &HeaderMap, name: &HeaderName, default: &HeaderValue) -> HeaderMap {
    let mut out = headers.clone();
    let value = headers.get(name).cloned().unwrap_or_else(|| default.clone());
    out.insert(name.clone(), value);
    out
}

/// Headers of an inbound request that may be replayed against the upstream.
///
/// Drops `host` (the client sets it from the target URL), `content-length`
/// (the body may be rewritten), `accept-encoding` (the upstream body must stay
/// inspectable), hop-by-hop headers, and any header named in `connection`.
pub fn forwardable_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    strip_hop_by_hop(&mut out);
    out.remove(header::HOST);
    out.remove(header::CONTENT_LENGTH);
    out.remove(header::ACCEPT_ENCODING);
    out
}

/// Full outbound header set for a forwarded request.
pub fn outbound_headers(inbound: &HeaderMap, name: &HeaderName, default: &HeaderValue) -> HeaderMap {
    with_api_version(&forwardable_request_headers(inbound), name, default)
}

/// Headers of an upstream response that may be returned to the caller.
///
/// `content-length` is kept: it matches the buffered body, and for `HEAD` it
/// is the only statement of the entity size. Callers that replace the body
/// must drop it.
pub fn returnable_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    strip_hop_by_hop(&mut out);
    out
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("notion-version"),
            HeaderValue::from_static("2022-06-28"),
        )
    }

    #[test]
    fn adds_default_version_when_missing() {
        let (name, default) = version();
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));

        let out = with_api_version(&inbound, &name, &default);

        assert_eq!(out.get("Notion-Version").unwrap(), "2022-06-28");
        assert_eq!(out.get(header::AUTHORIZATION).unwrap(), "Bearer secret");
        // caller's map is untouched
        assert!(inbound.get("notion-version").is_none());
    }

    #[test]
    fn keeps_inbound_version_in_any_casing() {
        let (name, default) = version();
        let mut inbound = HeaderMap::new();
        inbound.insert(
            HeaderName::from_bytes(b"NOTION-VERSION").unwrap(),
            HeaderValue::from_static("2021-08-16"),
        );

        let out = with_api_version(&inbound, &name, &default);

        assert_eq!(out.get_all("notion-version").iter().count(), 1);
        assert_eq!(out.get("Notion-Version").unwrap(), "2021-08-16");
    }

    #[test]
    fn repeated_version_collapses_to_first() {
        let (name, default) = version();
        let mut inbound = HeaderMap::new();
        inbound.append("notion-version", HeaderValue::from_static("2022-02-22"));
        inbound.append("notion-version", HeaderValue::from_static("2022-06-28"));

        let out = with_api_version(&inbound, &name, &default);

        let values: Vec<_> = out.get_all("notion-version").iter().collect();
        assert_eq!(values, vec!["2022-02-22"]);
    }

    #[test]
    fn strips_headers_bound_to_the_inbound_connection() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("proxy.example.com"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        inbound.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        inbound.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        inbound.insert("x-trace", HeaderValue::from_static("1"));
        inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let out = forwardable_request_headers(&inbound);

        assert_eq!(out.len(), 1);
        assert_eq!(out.get(header::CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn response_headers_drop_hop_by_hop_only() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert("x-notion-request-id", HeaderValue::from_static("abc"));

        let out = returnable_response_headers(&upstream);

        assert!(out.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(out.get(header::CONTENT_LENGTH).unwrap(), "10");
        assert_eq!(out.get("x-notion-request-id").unwrap(), "abc");
    }
}
