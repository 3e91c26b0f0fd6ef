//! KQL emission errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    #[error("construct has no KQL representation: {0}")]
    UnrepresentableConstruct(String),
}
