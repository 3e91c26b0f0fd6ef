//! HTTP request/response models.

use serde::{Deserialize, Serialize};

use crate::translator::{Dialect, KqlQuery, TranslationStrategy};

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub query: String,

    #[serde(default = "default_dialect")]
    pub dialect: Dialect,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Allow AI fallback for this request (subject to server config)
    #[serde(default = "default_true")]
    pub enable_ai: bool,

    #[serde(default)]
    pub force_ai: bool,
}

fn default_dialect() -> Dialect {
    Dialect::Cypher
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub kql: String,
    pub strategy: TranslationStrategy,
    pub confidence: f64,
    pub diagnostics: Vec<String>,
    pub request_id: String,
}

impl TranslateResponse {
    pub fn from_result(result: KqlQuery, request_id: String) -> Self {
        TranslateResponse {
            kql: result.query,
            strategy: result.strategy,
            confidence: result.confidence,
            diagnostics: result
                .diagnostics
                .into_iter()
                .map(|warning| warning.message)
                .collect(),
            request_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub kql: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}
