//! Error types for the batch writer
//!
//! Operational failures of individual chunks (throttling that exhausts its
//! retries, rejected batches, transport faults) never surface as errors; they
//! are recorded in the run's aggregate. Only the conditions below abort a run.

use thiserror::Error;

/// Result type alias for the batch writer
pub type Result<T> = std::result::Result<T, BatchError>;

/// Main error type for the batch writer
#[derive(Error, Debug)]
pub enum BatchError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller-supplied partition-key function failed for an item
    #[error("Partition key extraction failed for item {index}: {message}")]
    PartitionKey { index: usize, message: String },

    /// The storage service could not be reached at all
    #[error("Storage service unavailable: {0}")]
    StoreUnavailable(String),

    /// A partition worker panicked or was aborted
    #[error("Partition worker failed: {0}")]
    Worker(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    /// Create a partition key error for the item at `index`
    pub fn partition_key(index: usize, message: impl Into<String>) -> Self {
        Self::PartitionKey {
            index,
            message: message.into(),
        }
    }
}

/// Errors raised by a storage collaborator before a batch response exists
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A single call failed in transit; the chunk is failed, the run continues
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service is unreachable; the run is aborted
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The batch was refused before submission (payload or operation limits)
    #[error("Batch rejected: {0}")]
    Rejected(String),
}
