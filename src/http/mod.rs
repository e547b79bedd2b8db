//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, body limits)
//!     → handler.rs (origin, preflight, resolution, rewrite)
//!     → client.rs (upstream call)
//!     → response.rs (copy status/headers/body, debug metadata)
//!     → Send to client
//! ```

pub mod client;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use handler::handle;
pub use request::X_REQUEST_ID;
pub use server::{build_router, HttpServer, ProxyState, ServerError};
