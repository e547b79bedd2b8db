//! Rewrite rule matching.
//!
//! # Responsibilities
//! - Match the request method against the rewrite methods
//! - Match the resolved upstream path against the page endpoint
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Matching runs on the resolved upstream path, not the inbound path
//! - Path matching is exact and case-sensitive
//! - No regex: one literal prefix plus a segment check

use axum::http::Method;

use crate::config::{PagePaths, RewriteConfig};

const PAGES_PATH: &str = "/v1/pages";

/// Trait for matching a (method, upstream path) pair against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Matches any of a fixed set of methods.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: &Method, _path: &str) -> bool {
        self.methods.contains(method)
    }
}

/// Matches the page endpoint, optionally including `/v1/pages/{id}`.
#[derive(Debug, Clone)]
pub struct PagePathMatcher {
    paths: PagePaths,
}

impl PagePathMatcher {
    pub fn new(paths: PagePaths) -> Self {
        Self { paths }
    }
}

impl Matcher for PagePathMatcher {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(PAGES_PATH) else {
            return false;
        };
        if rest.is_empty() {
            return true;
        }
        match self.paths {
            PagePaths::Exact => false,
            PagePaths::ExactOrChild => rest
                .strip_prefix('/')
                .is_some_and(|id| !id.is_empty() && !id.contains('/')),
        }
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.matchers.iter().all(|m| m.matches(method, path))
    }
}

/// Build the matcher that decides whether a request body gets rewritten.
pub fn rewrite_matcher(config: &RewriteConfig) -> AndMatcher {
    let mut methods = vec![Method::POST];
    if config.apply_to_patch {
        methods.push(Method::PATCH);
    }
    AndMatcher::new(vec![
        Box::new(MethodMatcher::new(methods)),
        Box::new(PagePathMatcher::new(config.page_paths)),
    ])
}
