//! The user-visible failure type.
//!
//! Every stage error converts into [`TranslationError`] without loss;
//! the engine is the only place allowed to downgrade one (optimizer,
//! emission, and `Unsupported*` failures may elect the AI fallback).
//! Schema mismatches (unknown labels and properties) are always
//! surfaced.

use thiserror::Error;

use crate::ai_translator::AiClientError;
use crate::cypher::errors::{LexError, ParseError};
use crate::cypher::lexer::Span;
use crate::gremlin::GremlinError;
use crate::kql_generator::EmitError;
use crate::path_algorithms::PathAlgorithmError;
use crate::query_planner::errors::{OptimizerError, PlannerError};
use crate::resolver::ResolveError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslationError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Gremlin(#[from] GremlinError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    PathAlgorithm(#[from] PathAlgorithmError),

    #[error(transparent)]
    AiClient(#[from] AiClientError),

    #[error("generated KQL failed validation: {}", .0.join("; "))]
    InvalidGeneratedKql(Vec<String>),

    #[error("query is not supported by the deterministic translator: {0}")]
    UnsupportedPattern(String),

    #[error("translation deadline exceeded")]
    Timeout,

    #[error("translation was cancelled")]
    Cancelled,
}

impl TranslationError {
    /// Source span of the failure, when the stage tracked one.
    pub fn span(&self) -> Option<Span> {
        match self {
            TranslationError::Lex(e) => Some(e.span),
            TranslationError::Parse(e) => Some(e.span),
            TranslationError::Resolve(e) => Some(e.span()),
            _ => None,
        }
    }

    /// A human suggestion for fixable mistakes.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            TranslationError::Resolve(ResolveError::UnknownProperty {
                label, property, ..
            }) => Some(format!(
                "add a mapping for '{}' under label '{}' in the schema, or check the spelling",
                property, label
            )),
            TranslationError::Resolve(ResolveError::UnknownLabel { label, .. }) => Some(format!(
                "label '{}' is not in the schema catalog; labels are case-sensitive",
                label
            )),
            TranslationError::Resolve(ResolveError::UnboundVariable { name, .. }) => Some(
                format!("introduce '{}' in a MATCH pattern before referencing it", name),
            ),
            TranslationError::Parse(e) => {
                Some(format!("expected {} here", e.expected))
            }
            TranslationError::Gremlin(GremlinError::UnsupportedProjectionType(_)) => {
                Some("use values(...) to project properties".to_string())
            }
            _ => None,
        }
    }

    /// Whether the engine may downgrade this failure to the AI fallback
    /// route. Schema mismatches are never downgraded; the model cannot
    /// rescue a wrong catalog.
    pub fn is_downgradable(&self) -> bool {
        matches!(
            self,
            TranslationError::Optimizer(_)
                | TranslationError::Emit(EmitError::UnrepresentableConstruct(_))
                | TranslationError::Gremlin(
                    GremlinError::UnsupportedStart(_)
                        | GremlinError::UnsupportedPattern(_)
                        | GremlinError::UnsupportedMultiLabel { .. }
                        | GremlinError::UnsupportedProjectionType(_)
                        | GremlinError::UnsupportedTraversalDirection(_)
                )
                | TranslationError::Planner(
                    crate::query_planner::errors::PlannerError::MultiplePaths(_)
                )
                | TranslationError::UnsupportedPattern(_)
        )
    }
}

/// Order errors by source span for stable multi-error reporting.
pub fn sort_by_span(errors: &mut [TranslationError]) {
    errors.sort_by_key(|error| error.span().map(|span| span.start).unwrap_or(usize::MAX));
}
