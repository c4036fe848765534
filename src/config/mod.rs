//! Configuration management for the batch writer
//!
//! Configuration is loaded from a YAML file or from `PARTITION_WRITER_*`
//! environment variables, then validated before any run starts.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Prefix shared by all environment overrides
pub const ENV_PREFIX: &str = "PARTITION_WRITER_";

/// Main configuration struct for the batch writer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chunk size, retry ceiling and conflict handling
    #[serde(default)]
    pub batch: BatchConfig,
    /// Backoff between throttled attempts
    #[serde(default)]
    pub retry: RetryConfig,
    /// Partition fan-out bounds
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BatchError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml_str(&content)?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| BatchError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay any `PARTITION_WRITER_*` variables onto this configuration
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(chunk_size) = env_parse::<usize>("CHUNK_SIZE")? {
            self.batch.chunk_size = chunk_size;
        }
        if let Some(max_retries) = env_parse::<u32>("MAX_RETRIES")? {
            self.batch.max_retries = max_retries;
        }
        if let Some(policy) = env_var("CONFLICT_POLICY") {
            self.batch.conflict_policy = match policy.to_ascii_lowercase().as_str() {
                "strict" => ConflictPolicy::Strict,
                "skip_existing" => ConflictPolicy::SkipExisting,
                other => {
                    return Err(BatchError::Config(format!(
                        "Invalid conflict policy: {}",
                        other
                    )));
                }
            };
        }
        if let Some(base_delay_ms) = env_parse::<u64>("BASE_DELAY_MS")? {
            self.retry.base_delay_ms = base_delay_ms;
        }
        if let Some(multiplier) = env_parse::<f64>("BACKOFF_MULTIPLIER")? {
            self.retry.backoff_multiplier = multiplier;
        }
        if let Some(max_delay_ms) = env_parse::<u64>("MAX_DELAY_MS")? {
            self.retry.max_delay_ms = Some(max_delay_ms);
        }
        if let Some(jitter) = env_parse::<bool>("JITTER")? {
            self.retry.jitter = jitter;
        }
        if let Some(max_concurrency) = env_parse::<usize>("MAX_CONCURRENCY")? {
            self.concurrency.max_concurrent_partitions = max_concurrency;
        }
        if let Some(level) = env_var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(BatchError::Config(format!("Invalid log format: {}", other)));
                }
            };
        }
        Ok(())
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.batch.validate().map_err(BatchError::Config)?;
        self.retry.validate().map_err(BatchError::Config)?;
        self.concurrency.validate().map_err(BatchError::Config)?;
        self.logging.validate().map_err(BatchError::Config)?;
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            BatchError::Config(format!("Invalid {}{}: {}", ENV_PREFIX, name, e))
        }),
        None => Ok(None),
    }
}
