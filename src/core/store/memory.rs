//! In-memory transactional batch emulator
//!
//! Mirrors the behavior the batch writer relies on from a hosted store:
//! all-or-nothing create batches scoped to one partition key, per-operation
//! 409/424 results, a 100-operation ceiling, and optional request-unit
//! throughput limits that answer with 429 and a retry-after hint.

use super::traits::{DocumentStore, TransactionalBatch};
use super::types::{BatchResponse, OperationResult, PartitionKey};
use crate::config::MAX_BATCH_OPERATIONS;
use crate::utils::error::utils::{STATUS_BAD_REQUEST, STATUS_CONFLICT, STATUS_FAILED_DEPENDENCY};
use crate::utils::error::{ErrorUtils, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

/// Emulator configuration
#[derive(Debug, Clone)]
pub struct InMemoryStoreConfig {
    /// Field holding each document's identity
    pub id_field: String,
    /// Request units charged per created document
    pub charge_per_item: f64,
    /// Request units charged per operation of a rejected batch
    pub charge_per_failed_item: f64,
    /// Provisioned throughput; `None` disables throttling
    pub request_units_per_second: Option<f64>,
    /// Simulated service latency per batch
    pub latency: Option<Duration>,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            charge_per_item: 5.71,
            charge_per_failed_item: 1.0,
            request_units_per_second: None,
            latency: None,
        }
    }
}

impl InMemoryStoreConfig {
    pub fn with_throughput(mut self, request_units_per_second: f64) -> Self {
        self.request_units_per_second = Some(request_units_per_second);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_charge_per_item(mut self, charge: f64) -> Self {
        self.charge_per_item = charge;
        self
    }
}

struct ThroughputBudget {
    rate: f64,
    available: f64,
    refreshed_at: Instant,
}

impl ThroughputBudget {
    fn new(rate: f64) -> Self {
        Self {
            rate,
            available: rate,
            refreshed_at: Instant::now(),
        }
    }

    /// Withdraw `charge`, or return how long until it would be affordable
    fn try_consume(&mut self, charge: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.refreshed_at).as_secs_f64();
        self.available = (self.available + elapsed * self.rate).min(self.rate.max(charge));
        self.refreshed_at = now;

        if self.available >= charge {
            self.available -= charge;
            Ok(())
        } else {
            let deficit = charge - self.available;
            Err(Duration::from_secs_f64(deficit / self.rate))
        }
    }
}

#[derive(Default)]
struct StoreState {
    partitions: HashMap<PartitionKey, HashMap<String, Value>>,
    budget: Option<ThroughputBudget>,
    executed_batches: u64,
    throttled_batches: u64,
}

struct Shared {
    config: InMemoryStoreConfig,
    state: Mutex<StoreState>,
}

/// Thread-safe in-memory document store
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    shared: Arc<Shared>,
}

impl InMemoryDocumentStore {
    pub fn new(config: InMemoryStoreConfig) -> Self {
        let state = StoreState {
            budget: config
                .request_units_per_second
                .filter(|rate| *rate > 0.0)
                .map(ThroughputBudget::new),
            ..Default::default()
        };

        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
            }),
        }
    }

    /// Documents stored across all partitions
    pub fn document_count(&self) -> usize {
        self.shared
            .state
            .lock()
            .partitions
            .values()
            .map(HashMap::len)
            .sum()
    }

    /// Documents stored under one partition key
    pub fn partition_len(&self, partition_key: &PartitionKey) -> usize {
        self.shared
            .state
            .lock()
            .partitions
            .get(partition_key)
            .map_or(0, HashMap::len)
    }

    /// Number of distinct partitions holding documents
    pub fn partition_count(&self) -> usize {
        self.shared.state.lock().partitions.len()
    }

    /// Look up a document by partition key and id
    pub fn get(&self, partition_key: &PartitionKey, id: &str) -> Option<Value> {
        self.shared
            .state
            .lock()
            .partitions
            .get(partition_key)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Batches that reached the emulator, throttled ones included
    pub fn executed_batches(&self) -> u64 {
        self.shared.state.lock().executed_batches
    }

    /// Batches answered with 429
    pub fn throttled_batches(&self) -> u64 {
        self.shared.state.lock().throttled_batches
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(InMemoryStoreConfig::default())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn create_transactional_batch(
        &self,
        partition_key: &PartitionKey,
    ) -> Box<dyn TransactionalBatch> {
        Box::new(InMemoryBatch {
            shared: self.shared.clone(),
            partition_key: partition_key.clone(),
            operations: Vec::new(),
        })
    }
}

struct InMemoryBatch {
    shared: Arc<Shared>,
    partition_key: PartitionKey,
    operations: Vec<Value>,
}

impl InMemoryBatch {
    fn apply(&self, operations: Vec<Value>) -> BatchResponse {
        let config = &self.shared.config;
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        state.executed_batches += 1;

        if operations.len() > MAX_BATCH_OPERATIONS {
            return BatchResponse::failure(
                STATUS_BAD_REQUEST,
                format!(
                    "Batch request has {} operations; at most {} are supported",
                    operations.len(),
                    MAX_BATCH_OPERATIONS
                ),
            );
        }

        let charge = operations.len() as f64 * config.charge_per_item;
        if let Some(budget) = state.budget.as_mut() {
            if let Err(wait) = budget.try_consume(charge) {
                state.throttled_batches += 1;
                trace!(partition_key = %self.partition_key, ?wait, "throttling batch");
                return BatchResponse::throttled(Some(wait));
            }
        }

        let existing = state.partitions.get(&self.partition_key);
        let mut seen = HashSet::new();
        let statuses: Vec<Option<u16>> = operations
            .iter()
            .map(|doc| match doc.get(&config.id_field).and_then(Value::as_str) {
                None => Some(STATUS_BAD_REQUEST),
                Some(id) if !seen.insert(id.to_string()) => Some(STATUS_CONFLICT),
                Some(id) if existing.is_some_and(|docs| docs.contains_key(id)) => {
                    Some(STATUS_CONFLICT)
                }
                Some(_) => None,
            })
            .collect();

        if let Some(failed_status) = statuses.iter().flatten().next().copied() {
            let results = statuses
                .iter()
                .map(|status| {
                    OperationResult::new(
                        status.unwrap_or(STATUS_FAILED_DEPENDENCY),
                        config.charge_per_failed_item,
                    )
                })
                .collect();
            let mut response = BatchResponse::failure(
                failed_status,
                format!(
                    "Transactional batch aborted: {}",
                    ErrorUtils::describe_status(failed_status)
                ),
            )
            .with_operations(results)
            .with_activity_id(Uuid::new_v4().to_string());
            response.request_charge = operations.len() as f64 * config.charge_per_failed_item;
            return response;
        }

        let partition = state
            .partitions
            .entry(self.partition_key.clone())
            .or_default();
        let count = operations.len();
        for doc in operations {
            if let Some(id) = doc
                .get(&config.id_field)
                .and_then(Value::as_str)
                .map(str::to_string)
            {
                partition.insert(id, doc);
            }
        }

        debug!(partition_key = %self.partition_key, count, "committed batch");
        BatchResponse::success(charge)
            .with_operations(vec![
                OperationResult::new(201, config.charge_per_item);
                count
            ])
            .with_activity_id(Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl TransactionalBatch for InMemoryBatch {
    fn create_item(&mut self, document: Value) -> Result<(), StoreError> {
        if !document.is_object() {
            return Err(StoreError::Rejected(
                "documents must be JSON objects".to_string(),
            ));
        }
        self.operations.push(document);
        Ok(())
    }

    fn operation_count(&self) -> usize {
        self.operations.len()
    }

    async fn execute(&mut self) -> Result<BatchResponse, StoreError> {
        if self.operations.is_empty() {
            return Err(StoreError::Rejected(
                "transactional batch has no operations".to_string(),
            ));
        }

        if let Some(latency) = self.shared.config.latency {
            tokio::time::sleep(latency).await;
        }

        let operations = std::mem::take(&mut self.operations);
        Ok(self.apply(operations))
    }
}
