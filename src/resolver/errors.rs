//! Resolution errors: name binding and catalog mismatches.

use thiserror::Error;

use crate::cypher::lexer::Span;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("unknown label: {label}")]
    UnknownLabel { label: String, span: Span },

    #[error("unknown relationship type: {rel_type}")]
    UnknownRelationship { rel_type: String, span: Span },

    #[error("unknown property '{property}' on '{variable}' (label '{label}')")]
    UnknownProperty {
        variable: String,
        property: String,
        label: String,
        span: Span,
    },

    #[error("variable '{name}' is not bound by a MATCH pattern")]
    UnboundVariable { name: String, span: Span },

    #[error("duplicate alias '{alias}' in RETURN")]
    DuplicateAlias { alias: String, span: Span },

    #[error(
        "relationship '{rel_type}' connects {expected_from} to {expected_to}, \
         which does not match the attached node labels"
    )]
    RelationshipArityMismatch {
        rel_type: String,
        expected_from: String,
        expected_to: String,
        span: Span,
    },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UnknownLabel { span, .. }
            | ResolveError::UnknownRelationship { span, .. }
            | ResolveError::UnknownProperty { span, .. }
            | ResolveError::UnboundVariable { span, .. }
            | ResolveError::DuplicateAlias { span, .. }
            | ResolveError::RelationshipArityMismatch { span, .. } => *span,
        }
    }
}
