//! HTTP handlers for the translation API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::translator::{QueryContext, TranslationError};

use super::models::{
    ErrorResponse, TranslateRequest, TranslateResponse, ValidateRequest, ValidateResponse,
};
use super::AppState;

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn translate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let context = QueryContext {
        request_id: Uuid::new_v4(),
        user_id: request.user_id.clone(),
        tenant_id: request.tenant_id.clone(),
        permissions: Vec::new(),
        enable_ai: request.enable_ai,
        force_ai: request.force_ai,
    };

    log::info!(
        "request {}: translating {:?} query ({} chars)",
        context.request_id,
        request.dialect,
        request.query.len()
    );

    match state
        .engine
        .translate(&request.query, request.dialect, &context)
        .await
    {
        Ok(result) => Ok(Json(TranslateResponse::from_result(
            result,
            context.request_id.to_string(),
        ))),
        Err(error) => Err(error_response(error)),
    }
}

pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    let result = state.engine.validate_detailed(&request.kql);
    Json(ValidateResponse {
        is_valid: result.is_valid,
        errors: result.errors,
        warnings: result.warnings,
    })
}

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.engine.statistics();
    Json(serde_json::json!({
        "cache": stats.cache,
        "routes": stats.routes,
        "validations": stats.validations,
        "validation_errors": stats.validation_errors,
    }))
}

fn error_response(error: TranslationError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        TranslationError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        TranslationError::AiClient(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    let body = ErrorResponse {
        span: error.span().map(|span| (span.start, span.end)),
        suggested_fix: error.suggested_fix(),
        error: error.to_string(),
    };
    (status, Json(body))
}
