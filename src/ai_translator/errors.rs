//! AI client error kinds.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiClientError {
    #[error("rate limited by the model API (retry after: {retry_after_secs:?})")]
    RateLimit { retry_after_secs: Option<u64> },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("retries exhausted after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: String,
    },
}

impl AiClientError {
    /// Rate-limit and server-side errors are retryable; authentication
    /// and other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiClientError::RateLimit { .. } | AiClientError::Network(_) => true,
            AiClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
