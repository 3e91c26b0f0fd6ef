//! Error types for Gremlin parsing and lowering.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GremlinError {
    #[error("traversal must start with g.V(): {0}")]
    UnsupportedStart(String),

    #[error("unsupported traversal pattern: {0}")]
    UnsupportedPattern(String),

    #[error("multiple labels on variable '{variable}' are not supported")]
    UnsupportedMultiLabel { variable: String },

    #[error("projection type '{0}' is not supported (supported: values)")]
    UnsupportedProjectionType(String),

    #[error("traversal direction '{0}' is not supported (supported: out, in, both)")]
    UnsupportedTraversalDirection(String),

    #[error("step '{step}' expects {expected} argument(s), got {found}")]
    WrongArgCount {
        step: String,
        expected: String,
        found: usize,
    },

    #[error("failed to parse traversal: {0}")]
    Parse(String),
}
