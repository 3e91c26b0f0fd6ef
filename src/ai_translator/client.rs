//! AI translator client contract and the deterministic mock.
//!
//! The real model client lives outside this crate; the translator only
//! depends on this trait. The mock mirrors the external client's
//! behavior closely enough for routing, retry, and streaming tests, and
//! serves deployments without an API key.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures_util::stream::{self, Stream};

use super::errors::AiClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A completed translation from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct AiTranslation {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub stop_reason: Option<String>,
}

/// Streaming responses: incremental deltas terminated by a final
/// message carrying usage.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Delta(String),
    Final(AiTranslation),
}

pub type TranslationStream =
    Pin<Box<dyn Stream<Item = Result<StreamChunk, AiClientError>> + Send>>;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff with jitter: `base * 2^attempt`, capped at
    /// `max_delay`, plus up to 25% random spread.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)));
        let capped = exponential.min(self.max_delay);
        let jitter_window = capped.as_millis() as u64 / 4;
        if jitter_window == 0 {
            return capped;
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0);
        capped + Duration::from_millis(nanos % jitter_window)
    }
}

#[async_trait]
pub trait AiTranslatorClient: Send + Sync {
    /// Translate a natural-language or graph-query prompt into KQL.
    async fn translate_query(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        system: Option<&str>,
    ) -> Result<AiTranslation, AiClientError>;

    /// Streaming variant yielding partial contents and a terminal
    /// message with usage.
    async fn translate_query_stream(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TranslationStream, AiClientError>;

    fn retry_config(&self) -> &RetryConfig;
}

/// Calls `translate_query` with bounded retries. Only rate-limit,
/// network, and server errors are retried; authentication failures are
/// surfaced immediately.
pub async fn translate_with_retry(
    client: &dyn AiTranslatorClient,
    prompt: &str,
    max_tokens: u32,
    temperature: f32,
    system: Option<&str>,
) -> Result<AiTranslation, AiClientError> {
    let config = client.retry_config().clone();
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        match client
            .translate_query(prompt, max_tokens, temperature, system)
            .await
        {
            Ok(translation) => return Ok(translation),
            Err(error) if error.is_retryable() && attempt < config.max_retries => {
                let delay = config.backoff_delay(attempt);
                log::warn!(
                    "AI translation attempt {} failed ({}); retrying in {:?}",
                    attempt + 1,
                    error,
                    delay
                );
                tokio::time::sleep(delay).await;
                last_error = Some(error);
            }
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => {
                last_error = Some(error);
                break;
            }
        }
    }

    Err(AiClientError::RetriesExhausted {
        attempts: config.max_retries + 1,
        last_error: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

const MOCK_MODEL: &str = "mock-kql-translator";

/// Deterministic mock client: pattern-matches the prompt onto canned
/// KQL shapes and tracks call statistics.
pub struct MockAiClient {
    retry: RetryConfig,
    requests: AtomicU64,
}

impl MockAiClient {
    pub fn new() -> Self {
        MockAiClient {
            retry: RetryConfig::default(),
            requests: AtomicU64::new(0),
        }
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn reset_statistics(&self) {
        self.requests.store(0, Ordering::Relaxed);
    }

    fn canned_response(prompt: &str) -> String {
        let lowered = prompt.to_lowercase();
        if lowered.contains("count") {
            "graph.nodes | summarize count()".to_string()
        } else if lowered.contains("-[") || lowered.contains("edge") || lowered.contains("relationship")
        {
            "graph.edges | make-graph source_id --> target_id with graph.nodes on node_id | graph-match (a)-[r]->(b) | project a, b".to_string()
        } else if lowered.contains("path") {
            "graph.edges | make-graph source_id --> target_id with graph.nodes on node_id | graph-shortest-paths (a)-[]->(b)".to_string()
        } else {
            "graph.nodes | project n | limit 100".to_string()
        }
    }

    fn usage(prompt: &str, content: &str) -> TokenUsage {
        TokenUsage {
            input_tokens: (prompt.len() as u64 / 4).max(1),
            output_tokens: (content.len() as u64 / 4).max(1),
        }
    }
}

impl Default for MockAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiTranslatorClient for MockAiClient {
    async fn translate_query(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
        _system: Option<&str>,
    ) -> Result<AiTranslation, AiClientError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let content = Self::canned_response(prompt);
        Ok(AiTranslation {
            usage: Self::usage(prompt, &content),
            content,
            model: MOCK_MODEL.to_string(),
            stop_reason: Some("end_turn".to_string()),
        })
    }

    async fn translate_query_stream(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TranslationStream, AiClientError> {
        let translation = self
            .translate_query(prompt, max_tokens, temperature, None)
            .await?;

        let mut chunks: Vec<Result<StreamChunk, AiClientError>> = translation
            .content
            .split_inclusive(' ')
            .map(|piece| Ok(StreamChunk::Delta(piece.to_string())))
            .collect();
        chunks.push(Ok(StreamChunk::Final(translation)));

        Ok(Box::pin(stream::iter(chunks)))
    }

    fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }
}
