//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handler and server produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
