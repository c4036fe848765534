//! Storage collaborator traits
//!
//! The batch writer needs exactly three calls from a document store: open a
//! transactional batch for a partition key, add create operations to it, and
//! execute it.

use super::types::{BatchResponse, PartitionKey};
use crate::utils::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// A single-partition atomic group of create operations
#[async_trait]
pub trait TransactionalBatch: Send {
    /// Queue a create operation for `document`
    fn create_item(&mut self, document: Value) -> Result<(), StoreError>;

    /// Number of queued operations
    fn operation_count(&self) -> usize;

    /// Submit every queued operation as one transaction
    ///
    /// A batch is single-use; the queued operations are consumed.
    async fn execute(&mut self) -> Result<BatchResponse, StoreError>;
}

/// Partitioned document store supporting transactional batches
pub trait DocumentStore: Send + Sync {
    /// Open an empty transactional batch scoped to `partition_key`
    fn create_transactional_batch(&self, partition_key: &PartitionKey)
    -> Box<dyn TransactionalBatch>;
}
