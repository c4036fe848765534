//! Batch, retry and concurrency validators

use super::trait_def::Validate;
use crate::config::models::*;
use tokio::sync::Semaphore;
use tracing::debug;

impl Validate for BatchConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating batch configuration");

        if self.chunk_size == 0 {
            return Err("Batch chunk size must be greater than 0".to_string());
        }

        if self.chunk_size > MAX_BATCH_OPERATIONS {
            return Err(format!(
                "Batch chunk size {} exceeds the provider limit of {} operations",
                self.chunk_size, MAX_BATCH_OPERATIONS
            ));
        }

        if self.max_retries == 0 {
            return Err("Batch max retries must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err("Retry backoff multiplier must be at least 1.0".to_string());
        }

        if let Some(max_delay_ms) = self.max_delay_ms {
            if max_delay_ms < self.base_delay_ms {
                return Err("Retry max delay must not be less than base delay".into());
            }
        }

        Ok(())
    }
}

impl Validate for ConcurrencyConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_partitions == 0 {
            return Err("Max concurrent partitions must be greater than 0".into());
        }

        if self.max_concurrent_partitions > Semaphore::MAX_PERMITS {
            return Err(format!(
                "Max concurrent partitions must not exceed {}",
                Semaphore::MAX_PERMITS
            ));
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.level.trim().is_empty() {
            return Err("Log level must not be empty".to_string());
        }

        Ok(())
    }
}
