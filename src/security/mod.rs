//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (reject origins outside the allow-list, 403)
//!     → cors.rs (answer preflight, accepted methods)
//!     → Pass to routing
//! Outgoing response:
//!     → cors.rs (overwrite CORS headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a non-UTF-8 Origin never matches the allow-list
//! - Rejections happen before any upstream interaction

pub mod cors;
pub mod origin;

pub use cors::CorsPolicy;
pub use origin::OriginAllowList;
