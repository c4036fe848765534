//! Fan-out configuration

use super::defaults::*;
use serde::{Deserialize, Serialize};

/// Concurrency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Partition groups processed at the same time
    #[serde(default = "default_max_concurrent_partitions")]
    pub max_concurrent_partitions: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_partitions: default_max_concurrent_partitions(),
        }
    }
}
