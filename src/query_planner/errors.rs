//! Planner and optimizer error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("query has no traversal to plan")]
    EmptyTraversal,

    #[error("invalid path structure: {0}")]
    InvalidPathStructure(String),

    #[error("unsupported combination of paths: {0}")]
    MultiplePaths(String),
}

/// A rewrite rule aborted. Non-fatal when a fallback route is allowed;
/// the classifier decides.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("optimizer rule '{rule}' failed: {reason}")]
pub struct OptimizerError {
    pub rule: &'static str,
    pub reason: String,
}

impl OptimizerError {
    pub fn new(rule: &'static str, reason: impl Into<String>) -> Self {
        OptimizerError {
            rule,
            reason: reason.into(),
        }
    }
}
