use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Translator behavior knobs, shared by the library entry points and the
/// HTTP server.
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Unknown KQL operators and tables become errors instead of warnings
    pub strict_mode: bool,

    /// Permit AiPath routing; when false, unsupported queries fail
    pub enable_ai: bool,

    /// Pattern cache entry bound
    #[validate(range(min = 1, max = 1_000_000, message = "cache capacity out of range"))]
    pub cache_capacity: usize,

    /// Pattern cache entry TTL, seconds
    #[validate(range(min = 1, message = "cache TTL must be positive"))]
    pub cache_ttl_secs: u64,

    /// Upper bound on optimizer rule-pipeline passes
    #[validate(range(min = 1, max = 256, message = "iteration cap out of range"))]
    pub optimizer_iteration_cap: u32,

    /// Minimum per-route success rate before the classifier damps a route
    #[validate(range(min = 0.0, max = 1.0, message = "threshold must be within [0, 1]"))]
    pub route_success_threshold: f64,

    /// Per-request wall-clock budget, milliseconds
    #[validate(range(min = 10, message = "deadline too small"))]
    pub deadline_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            enable_ai: true,
            cache_capacity: 1000,
            cache_ttl_secs: 24 * 3600,
            optimizer_iteration_cap: 32,
            route_success_threshold: 0.5,
            deadline_ms: 30_000,
        }
    }
}

impl TranslatorConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            strict_mode: parse_env_var("KUSTOGRAPH_STRICT_MODE", "false")?,
            enable_ai: parse_env_var("KUSTOGRAPH_ENABLE_AI", "true")?,
            cache_capacity: parse_env_var("KUSTOGRAPH_CACHE_CAPACITY", "1000")?,
            cache_ttl_secs: parse_env_var("KUSTOGRAPH_CACHE_TTL_SECS", "86400")?,
            optimizer_iteration_cap: parse_env_var("KUSTOGRAPH_OPTIMIZER_ITERATION_CAP", "32")?,
            route_success_threshold: parse_env_var("KUSTOGRAPH_ROUTE_SUCCESS_THRESHOLD", "0.5")?,
            deadline_ms: parse_env_var("KUSTOGRAPH_DEADLINE_MS", "30000")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// HTTP server configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host address
    #[validate(length(min = 1, message = "HTTP host cannot be empty"))]
    pub http_host: String,

    /// HTTP server port (1-65535)
    #[validate(range(
        min = 1,
        max = 65535,
        message = "HTTP port must be between 1 and 65535"
    ))]
    pub http_port: u16,

    /// Optional path to a schema YAML file; built-in schema otherwise
    pub schema_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            schema_path: None,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            http_host: env::var("KUSTOGRAPH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_env_var("KUSTOGRAPH_PORT", "8080")?,
            schema_path: env::var("KUSTOGRAPH_SCHEMA_PATH").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Merge CLI overrides on top (CLI wins over environment).
    pub fn merge_cli(&mut self, cli: CliConfig) {
        self.http_host = cli.http_host;
        self.http_port = cli.http_port;
        if cli.schema_path.is_some() {
            self.schema_path = cli.schema_path;
        }
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub http_host: String,
    pub http_port: u16,
    pub schema_path: Option<String>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
