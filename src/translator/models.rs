//! Public API models for the translate entry point.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai_translator::QueryComplexity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Cypher,
    Gremlin,
}

/// How the final KQL was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStrategy {
    /// Cache/template hit
    FastPath,
    /// Full parse → plan → emit pipeline
    PlanPath,
    /// External model fallback
    AiPath,
}

/// Non-fatal diagnostic attached to a successful translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Warning {
            message: message.into(),
        }
    }
}

/// Per-request caller context.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub request_id: Uuid,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub permissions: Vec<String>,
    pub enable_ai: bool,
    pub force_ai: bool,
}

impl Default for QueryContext {
    fn default() -> Self {
        QueryContext {
            request_id: Uuid::new_v4(),
            user_id: None,
            tenant_id: None,
            permissions: Vec::new(),
            enable_ai: true,
            force_ai: false,
        }
    }
}

/// A successful translation.
#[derive(Debug, Clone, Serialize)]
pub struct KqlQuery {
    pub query: String,
    pub strategy: TranslationStrategy,
    /// Classifier confidence, clamped to [0, 1]
    pub confidence: f64,
    pub diagnostics: Vec<Warning>,
}

/// Translation metadata computed without running the full pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationSummary {
    pub num_hops: usize,
    pub has_variable_length_paths: bool,
    pub num_conditions: usize,
    pub has_aggregation: bool,
    pub estimated_complexity: QueryComplexity,
}
