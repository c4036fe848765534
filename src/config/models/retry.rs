//! Retry configuration types

use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff applied between throttled attempts of a chunk
///
/// The delay before retry `k` (1-indexed) is `base_delay_ms * backoff_multiplier^k`,
/// which with the defaults is `2^k` seconds. No cap and no jitter unless set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Growth factor per retry
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Upper bound on a single delay (milliseconds)
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    /// Add random jitter of up to +/-10%
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: None,
            jitter: false,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay_ms.map(Duration::from_millis)
    }
}
