//! HTTP surface: a thin axum router over one process-wide
//! [`TranslatorEngine`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::ai_translator::MockAiClient;
use crate::config::{ServerConfig, TranslatorConfig};
use crate::schema_catalog::SchemaCatalog;
use crate::translator::TranslatorEngine;

pub mod handlers;
pub mod models;

pub struct AppState {
    pub engine: TranslatorEngine,
    pub config: ServerConfig,
    /// Wall-clock budget enforced at the HTTP boundary, mirroring the
    /// engine's per-request deadline.
    pub request_timeout: Duration,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let deadline = state.request_timeout;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/translate", post(handlers::translate_handler))
        .route("/validate", post(handlers::validate_handler))
        .route("/stats", get(handlers::stats_handler))
        .layer(ServiceBuilder::new().layer(TimeoutLayer::new(deadline)))
        .with_state(state)
}

pub async fn run_with_config(server_config: ServerConfig) -> anyhow::Result<()> {
    dotenv().ok();

    let translator_config =
        TranslatorConfig::from_env().context("invalid translator configuration")?;

    let catalog = match &server_config.schema_path {
        Some(path) => {
            let catalog = SchemaCatalog::from_yaml_file(path)
                .with_context(|| format!("failed to load schema from {}", path))?;
            log::info!("loaded schema from {}", path);
            catalog
        }
        None => {
            log::info!("no schema path configured; using built-in security graph schema");
            SchemaCatalog::builtin_default()
        }
    };

    for violation in catalog.validate() {
        log::warn!("schema warning: {}", violation);
    }

    let request_timeout = translator_config.deadline();

    // The mock model client stands in until a real API key is wired up;
    // routing and fallback behavior are identical.
    let engine = TranslatorEngine::new(Arc::new(catalog), translator_config)
        .with_ai_client(Arc::new(MockAiClient::new()));

    let state = Arc::new(AppState {
        engine,
        config: server_config.clone(),
        request_timeout,
    });
    let router = build_router(state);

    let addr = format!("{}:{}", server_config.http_host, server_config.http_port);
    log::info!("listening on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, router)
        .await
        .context("server error")?;
    Ok(())
}
