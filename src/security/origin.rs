//! Origin allow-listing.

use axum::http::{header, HeaderMap};

/// Origins permitted to call the proxy. An empty list permits everyone.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    origins: Vec<String>,
}

impl OriginAllowList {
    pub fn new(origins: &[String]) -> Self {
        Self {
            origins: origins.iter().map(|o| o.trim_end_matches('/').to_ascii_lowercase()).collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.origins.is_empty()
    }

    /// Requests without an `Origin` header are not restricted.
    pub fn permits(&self, headers: &HeaderMap) -> bool {
        if !self.is_enabled() {
            return true;
        }
        match headers.get(header::ORIGIN) {
            None => true,
            Some(value) => value
                .to_str()
                .map(|origin| self.origins.iter().any(|o| o.eq_ignore_ascii_case(origin)))
                .unwrap_or(false),
        }
    }
}
