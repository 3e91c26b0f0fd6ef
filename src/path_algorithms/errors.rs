//! Validation errors for path-algorithm translation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathAlgorithmError {
    #[error("source must be a non-empty variable name")]
    EmptySource,

    #[error("target must be a non-empty variable name")]
    EmptyTarget,

    #[error("path length cannot be negative")]
    NegativeLength,

    #[error("minimum path length {min} exceeds maximum {max}")]
    InvertedBounds { min: u32, max: u32 },

    #[error("weighted path search requires a weight property")]
    MissingWeightProperty,

    #[error("at least one {0} is required")]
    EmptyNodeList(&'static str),

    #[error("max_paths must be positive")]
    NonPositiveMaxPaths,
}
