//! Default value functions for configuration

use super::logging::LogFormat;

/// Provider ceiling on operations per transactional batch
pub const MAX_BATCH_OPERATIONS: usize = 100;

pub fn default_chunk_size() -> usize {
    MAX_BATCH_OPERATIONS
}

pub fn default_max_retries() -> u32 {
    5
}

pub fn default_base_delay_ms() -> u64 {
    1000
}

pub fn default_backoff_multiplier() -> f64 {
    2.0
}

pub fn default_max_concurrent_partitions() -> usize {
    64
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> LogFormat {
    LogFormat::Text
}
