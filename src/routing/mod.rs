//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query)
//!     → target.rs (resolve upstream URL, redirect, or banner)
//!     → matcher.rs (does the resolved path get a body rewrite?)
//!     → Return: Resolution + rewrite decision
//! ```
//!
//! # Design Decisions
//! - Resolver and matchers are built once at startup, immutable at runtime
//! - Deterministic: same input always resolves to the same target
//! - No regex in hot path (literal prefix matching only)

pub mod matcher;
pub mod target;

pub use matcher::{rewrite_matcher, AndMatcher, Matcher};
pub use target::{Resolution, Target, TargetResolver};
