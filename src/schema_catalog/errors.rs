//! Error types for schema catalog loading and lookups.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("unknown label: {0}")]
    UnknownLabel(String),

    #[error("unknown relationship type: {0}")]
    UnknownRelationship(String),

    #[error("unknown property '{property}' on label '{label}'")]
    UnknownProperty { label: String, property: String },

    #[error("no relationship connects label '{from}' to label '{to}'")]
    NoPath { from: String, to: String },

    #[error("schema reference error: {0}")]
    InvalidReference(String),

    #[error("unknown property type: {0}")]
    UnknownType(String),

    #[error("failed to read schema file: {0}")]
    Io(String),

    #[error("failed to parse schema: {0}")]
    Parse(String),
}
