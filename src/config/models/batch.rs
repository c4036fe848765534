//! Batch sizing configuration types

use super::defaults::*;
use serde::{Deserialize, Serialize};

/// How per-item "already exists" results are treated on a retried chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Any non-success response fails the whole chunk
    #[default]
    Strict,
    /// After a throttled attempt, conflicting items count as written and the
    /// rest of the chunk is resubmitted
    SkipExisting,
}

/// Batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum items per transactional batch
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum attempts per chunk while throttled
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Handling of conflicts after a throttled attempt
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}
