//! CORS-relaxing reverse proxy for the Notion REST API.
//!
//! Browser pages call the proxy; the proxy forwards to the upstream API,
//! injects `Notion-Version` when missing, reshapes page-creation bodies, and
//! adds permissive CORS headers to every response.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod transform;

pub use config::schema::ProxyConfig;
pub use http::{handle, HttpServer, ProxyState};
pub use lifecycle::Shutdown;
