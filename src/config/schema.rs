//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream API settings.
    pub upstream: UpstreamConfig,

    /// How inbound paths map onto the upstream.
    pub routing: RoutingConfig,

    /// Page-creation body rewrite.
    pub rewrite: RewriteConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Debugging aids for development deployments.
    pub debug: DebugConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and host of the upstream API, without a path.
    pub base_url: String,

    /// Name of the API version header injected on forwarded requests.
    pub version_header: String,

    /// Value used when the inbound request carries no version header.
    pub api_version: String,

    /// Deadline for the whole upstream exchange in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com".to_string(),
            version_header: "Notion-Version".to_string(),
            api_version: "2022-06-28".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Addressing convention for inbound paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// The upstream URL is embedded in the path (`/https://api.notion.com/v1/...`),
    /// with `/redirect/<url>` and a usage banner at `/`. Unmatched paths fall
    /// back to passthrough.
    #[default]
    Embedded,
    /// The inbound path is a path on the upstream host.
    Passthrough,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    pub addressing: Addressing,
}

/// Shape of the JSON-encoded string carried in the rewrite field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RewritePayload {
    /// `{"properties": {...}, "children": [...]}`
    #[default]
    PropertiesAndChildren,
    /// The properties object itself; children come from the outer body.
    Properties,
}

/// Which upstream paths count as the page endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PagePaths {
    /// `/v1/pages` only.
    Exact,
    /// `/v1/pages` and `/v1/pages/{id}`.
    #[default]
    ExactOrChild,
}

/// Page-creation body rewrite configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Enable the rewrite.
    pub enabled: bool,

    /// Name of the field carrying the JSON-encoded string.
    pub field: String,

    pub payload: RewritePayload,

    pub page_paths: PagePaths,

    /// Also rewrite PATCH requests (page updates).
    pub apply_to_patch: bool,

    /// Reject page bodies that are not valid JSON instead of forwarding them raw.
    pub strict_json: bool,

    /// Reject rewrites that produce no `properties`.
    pub require_properties: bool,

    /// Emit `"children": []` when the source has none.
    pub default_children: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            field: "propertiesAndChildrenString".to_string(),
            payload: RewritePayload::default(),
            page_paths: PagePaths::default(),
            apply_to_patch: false,
            strict_json: false,
            require_properties: false,
            default_children: false,
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Accept and advertise PATCH.
    pub allow_patch: bool,

    /// Origins allowed to call the proxy. Empty means any origin.
    pub allowed_origins: Vec<String>,

    /// `Access-Control-Max-Age` on preflight responses.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_patch: true,
            allowed_origins: Vec::new(),
            max_age_secs: 86_400,
        }
    }
}

/// Debugging aids. Both are off in production.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Merge a `debug` object into upstream JSON error bodies containing `marker`.
    pub inject_metadata: bool,

    pub marker: String,

    /// Include the error source chain in 500 responses.
    pub expose_error_chain: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            inject_metadata: false,
            marker: "invalid_request_url".to_string(),
            expose_error_chain: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
