//! Sentinel backend contract.
//!
//! The translator never executes KQL itself; downstream code hands the
//! emitted program to a client implementing this trait. Only the
//! contract lives here (result envelopes, error kinds, and the async
//! trait) so the engine can be tested against stubs and the real
//! workspace client can live in its own crate.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Partial,
    Failure,
}

/// Tabular result of a KQL query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KqlResult {
    pub status: ExecutionStatus,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
    pub execution_time_ms: u64,
    pub error: Option<String>,
}

/// Result of a management command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementResult {
    pub status: ExecutionStatus,
    pub command: String,
    pub execution_time_ms: u64,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited (retry after: {retry_after_secs:?})")]
    RateLimit { retry_after_secs: Option<u64> },

    #[error("execution failed: {0}")]
    Execution(String),
}

/// The workspace client consumed by downstream execution code.
#[async_trait]
pub trait SentinelBackend: Send + Sync {
    /// Run a KQL query over the given timespan.
    async fn execute_kql(
        &self,
        query: &str,
        timespan: Option<Duration>,
    ) -> Result<KqlResult, BackendError>;

    /// Run a management (control) command.
    async fn execute_management_command(
        &self,
        command: &str,
    ) -> Result<ManagementResult, BackendError>;
}
