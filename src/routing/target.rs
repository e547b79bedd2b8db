//! Target resolution.
//!
//! # Responsibilities
//! - Map an inbound URI onto a URL on the fixed upstream host
//! - Recognise the embedded-URL shapes (`/https://api.notion.com/...`,
//!   `/redirect/<url>`, the `/` banner)
//! - Carry the inbound query string over unchanged
//!
//! # Design Decisions
//! - Resolution is a pure function of (config, method, uri)
//! - The target host is always the upstream host: paths are set on a clone of
//!   the base URL, never joined, so `//other.host/...` cannot escape
//! - Shapes that do not match fall back to forwarding the raw path

use axum::http::{Method, Uri};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::Addressing;

const REDIRECT_PREFIX: &str = "/redirect/";

/// A resolved upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    path: String,
}

impl Target {
    /// Full upstream URL including the query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Upstream path, as extracted from the inbound request.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Outcome of resolving an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Forward to the upstream.
    Forward(Target),
    /// Answer with a 302 to this URL.
    Redirect(Url),
    /// Answer with the plain-text usage banner.
    Banner,
}

/// Resolves inbound URIs against the upstream base URL.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    base: Url,
    addressing: Addressing,
    /// `/https://api.notion.com`
    embedded_prefix: String,
}

impl TargetResolver {
    /// `base` must be an absolute http(s) URL without path, as enforced by
    /// config validation.
    pub fn new(base: Url, addressing: Addressing) -> Self {
        let embedded_prefix = format!("/{}", base.as_str().trim_end_matches('/'));
        Self {
            base,
            addressing,
            embedded_prefix,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve an inbound request line.
    pub fn resolve(&self, method: &Method, uri: &Uri) -> Resolution {
        let path = uri.path();
        let query = uri.query();

        if self.addressing == Addressing::Passthrough {
            return Resolution::Forward(self.target_for_path(path, query));
        }

        let is_read = method == Method::GET || method == Method::HEAD;

        if is_read && path == "/" {
            return Resolution::Banner;
        }

        if is_read {
            if let Some(location) = self.redirect_location(path, query) {
                return Resolution::Redirect(location);
            }
        }

        if let Some(upstream_path) = self.extract_embedded(path) {
            return Resolution::Forward(self.target_for_path(upstream_path, query));
        }

        if path.starts_with("/http") {
            if let Ok(decoded) = percent_decode_str(path).decode_utf8() {
                if let Some(upstream_path) = self.extract_embedded(&decoded) {
                    return Resolution::Forward(self.target_for_path(upstream_path, query));
                }
            }
        }

        Resolution::Forward(self.target_for_path(path, query))
    }

    /// Build the upstream URL for `path` on the base host.
    pub fn target_for_path(&self, path: &str, query: Option<&str>) -> Target {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(query.filter(|q| !q.is_empty()));
        Target {
            url,
            path: path.to_string(),
        }
    }

    /// Path after the first `/<base-url>` occurrence that is followed by `/`.
    fn extract_embedded<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.match_indices(self.embedded_prefix.as_str())
            .map(|(start, prefix)| &path[start + prefix.len()..])
            .find(|rest| rest.starts_with('/'))
    }

    /// Location for `/redirect/<url>`, restricted to the upstream origin.
    fn redirect_location(&self, path: &str, query: Option<&str>) -> Option<Url> {
        let literal = path.strip_prefix(REDIRECT_PREFIX)?;
        let mut location = Url::parse(literal).ok().or_else(|| {
            let decoded = percent_decode_str(literal).decode_utf8().ok()?;
            Url::parse(&decoded).ok()
        })?;

        if location.origin() != self.base.origin() {
            tracing::debug!(location = %location, "Ignoring redirect outside the upstream origin");
            return None;
        }

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            location.set_query(Some(query));
        }
        Some(location)
    }
}
