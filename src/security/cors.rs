//! CORS response decoration.
//!
//! # Responsibilities
//! - Answer preflight requests without touching the upstream
//! - Overwrite the CORS headers on every response returned to the caller
//! - Decide which methods the proxy accepts
//!
//! # Design Decisions
//! - `Access-Control-Allow-Origin` is always `*`; credentials are never allowed
//! - Header values are rendered once at startup

use axum::http::{header, HeaderMap, HeaderValue, Method};

use crate::config::CorsConfig;

const BASE_ALLOW_HEADERS: &str = "Origin, X-Requested-With, Accept, Authorization, Content-Type";

/// Rendered CORS headers plus the accepted method set.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    methods: Vec<Method>,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    /// `version_header` is advertised in `Access-Control-Allow-Headers` as written.
    pub fn from_config(config: &CorsConfig, version_header: &str) -> Self {
        let mut methods = vec![Method::GET, Method::POST];
        if config.allow_patch {
            methods.push(Method::PATCH);
        }
        methods.push(Method::HEAD);

        let advertised = methods
            .iter()
            .map(Method::as_str)
            .chain(std::iter::once("OPTIONS"))
            .collect::<Vec<_>>()
            .join(", ");

        let allow_headers = HeaderValue::from_str(&format!("{}, {}", BASE_ALLOW_HEADERS, version_header))
            .unwrap_or_else(|_| HeaderValue::from_static(BASE_ALLOW_HEADERS));

        Self {
            methods,
            allow_methods: HeaderValue::from_str(&advertised)
                .unwrap_or_else(|_| HeaderValue::from_static("GET, POST, HEAD, OPTIONS")),
            allow_headers,
            max_age: HeaderValue::from(config.max_age_secs),
        }
    }

    /// Whether `method` is forwarded (OPTIONS is answered locally).
    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Overwrite the three CORS headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }

    /// Headers for a preflight answer.
    pub fn preflight_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.apply(&mut headers);
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        headers
    }
}
