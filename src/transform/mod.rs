//! Request and response transformation.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → headers.rs (copy headers, drop connection-bound ones, inject version)
//!     → body.rs (page requests only: reshape the JSON body)
//!     → [forward to upstream]
//!     → headers.rs (drop framing headers from the upstream response)
//!     → debug.rs (optional: annotate marked upstream errors)
//! ```
//!
//! # Design Decisions
//! - Every transform is a pure function over borrowed input
//! - Bodies not selected for rewrite are never parsed

pub mod body;
pub mod debug;
pub mod headers;

pub use body::{rewrite_page_body, PageBody, RewriteError};
pub use debug::{inject_debug, DebugInfo};
pub use headers::{outbound_headers, returnable_response_headers, with_api_version};
