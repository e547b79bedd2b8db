//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream base URL and header names/values
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending key, e.g. `upstream.base_url`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::new(
                    "upstream.base_url",
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("upstream.base_url", "missing host"));
            }
            if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::new(
                    "upstream.base_url",
                    "must not carry a path, query or fragment",
                ));
            }
        }
        Err(e) => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("invalid URL '{}': {}", config.upstream.base_url, e),
        )),
    }

    if HeaderName::from_bytes(config.upstream.version_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "upstream.version_header",
            format!("'{}' is not a valid header name", config.upstream.version_header),
        ));
    }

    if HeaderValue::from_str(&config.upstream.api_version).is_err() {
        errors.push(ValidationError::new(
            "upstream.api_version",
            "not a valid header value",
        ));
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than 0"));
    }

    if config.rewrite.field.trim().is_empty() {
        errors.push(ValidationError::new("rewrite.field", "must not be empty"));
    }

    for origin in &config.cors.allowed_origins {
        if HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("'{}' is not a valid header value", origin),
            ));
        }
    }

    if config.debug.inject_metadata && config.debug.marker.is_empty() {
        errors.push(ValidationError::new("debug.marker", "must not be empty"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "ftp://api.notion.com".into();
        config.upstream.version_header = "Notion Version".into();
        config.upstream.timeout_secs = 0;
        config.rewrite.field = " ".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "upstream.base_url",
                "upstream.version_header",
                "upstream.timeout_secs",
                "rewrite.field",
            ]
        );
    }

    #[test]
    fn base_url_with_path_is_rejected() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "https://api.notion.com/v1".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "upstream.base_url");
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
