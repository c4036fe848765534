//! Partitioned insert coordinator
//!
//! Runs one pipeline per partition group (chunk, execute with retry,
//! aggregate). Pipelines run concurrently, bounded by a semaphore; chunks of
//! one group run strictly in order. The call returns once every pipeline has
//! joined.

use super::aggregator::ResultAggregator;
use super::chunking::chunk_group;
use super::executor::TransactionalBatchExecutor;
use super::grouping::try_group_by_partition;
use super::retry::{BackoffPolicy, RetryController};
use super::types::{InsertSummary, PartitionGroup};
use crate::config::Config;
use crate::core::store::{DocumentStore, PartitionKey};
use crate::utils::error::{BatchError, Result};
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

/// Writes large item sets into a partitioned document store
#[derive(Clone)]
pub struct PartitionedWriter {
    store: Arc<dyn DocumentStore>,
    config: Config,
    cancel: CancellationToken,
}

impl PartitionedWriter {
    /// Create a writer with a validated configuration
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop runs when `cancel` fires
    ///
    /// Chunks already committed stay recorded; chunks not yet attempted are
    /// counted as cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that cancels every run of this writer
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Insert `items`, grouping them with `partition_key`
    pub async fn insert_partitioned<T, K, F>(
        &self,
        items: Vec<T>,
        partition_key: F,
    ) -> Result<InsertSummary>
    where
        T: Serialize + Send + 'static,
        K: Into<PartitionKey>,
        F: Fn(&T) -> K,
    {
        self.try_insert_partitioned(items, |item| Ok::<K, Infallible>(partition_key(item)))
            .await
    }

    /// Insert `items` with a fallible partition-key function
    ///
    /// A key extraction error aborts the run before any write is issued.
    pub async fn try_insert_partitioned<T, K, E, F>(
        &self,
        items: Vec<T>,
        partition_key: F,
    ) -> Result<InsertSummary>
    where
        T: Serialize + Send + 'static,
        K: Into<PartitionKey>,
        E: Display,
        F: Fn(&T) -> std::result::Result<K, E>,
    {
        let started = Instant::now();
        let total_items = items.len();
        info!("Starting batch insert of {} items", total_items);

        let groups = try_group_by_partition(items, partition_key)?;
        let partitions = groups.len();
        debug!(partitions, "Grouped items by partition key");

        let aggregator = Arc::new(ResultAggregator::new());
        self.run_groups(groups, aggregator.clone()).await?;

        let summary = InsertSummary::new(
            total_items,
            partitions,
            aggregator.snapshot(),
            started.elapsed(),
        );
        summary.log();
        Ok(summary)
    }

    async fn run_groups<T>(
        &self,
        groups: Vec<PartitionGroup<T>>,
        aggregator: Arc<ResultAggregator>,
    ) -> Result<()>
    where
        T: Serialize + Send + 'static,
    {
        let run_cancel = self.cancel.child_token();
        let controller = RetryController::new(
            TransactionalBatchExecutor::new(self.store.clone()),
            BackoffPolicy::from(&self.config.retry),
            self.config.batch.max_retries,
        )
        .with_conflict_policy(self.config.batch.conflict_policy)
        .with_cancellation(run_cancel.clone());

        let permits = Arc::new(Semaphore::new(
            self.config.concurrency.max_concurrent_partitions,
        ));
        let chunk_size = self.config.batch.chunk_size;
        let mut workers = JoinSet::new();

        for group in groups {
            let span = info_span!("partition", key = %group.key, items = group.len());
            let pipeline = GroupPipeline {
                controller: controller.clone(),
                aggregator: aggregator.clone(),
                permits: permits.clone(),
                cancel: run_cancel.clone(),
                chunk_size,
            };
            workers.spawn(pipeline.run(group).instrument(span));
        }

        let mut fatal: Option<BatchError> = None;
        while let Some(joined) = workers.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(e) => Some(BatchError::Worker(e.to_string())),
            };
            if let Some(e) = failure {
                if fatal.is_none() {
                    error!("Aborting batch insert: {}", e);
                    run_cancel.cancel();
                    fatal = Some(e);
                }
            }
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct GroupPipeline {
    controller: RetryController,
    aggregator: Arc<ResultAggregator>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    chunk_size: usize,
}

impl GroupPipeline {
    async fn run<T: Serialize>(self, group: PartitionGroup<T>) -> Result<()> {
        let PartitionGroup { key, items } = group;
        let mut remaining = items.len();

        let _permit = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.aggregator.record_cancelled(remaining);
                return Ok(());
            }
            permit = self.permits.clone().acquire_owned() => {
                permit.map_err(|e| BatchError::Worker(e.to_string()))?
            }
        };

        for chunk in chunk_group(items, self.chunk_size) {
            if self.cancel.is_cancelled() {
                self.aggregator.record_cancelled(remaining);
                return Ok(());
            }
            remaining -= chunk.len();

            let documents = match serialize_chunk(&chunk) {
                Ok(documents) => documents,
                Err(e) => {
                    error!(
                        partition_key = %key,
                        items = chunk.len(),
                        "Malformed item in chunk: {}",
                        e
                    );
                    self.aggregator.record_failure(chunk.len());
                    continue;
                }
            };

            let report = self.controller.run(&key, documents).await?;
            debug!(state = ?report.state, attempts = report.attempts, "Chunk finished");
            self.aggregator.record_chunk(&report);
        }

        Ok(())
    }
}

fn serialize_chunk<T: Serialize>(chunk: &[T]) -> serde_json::Result<Vec<Value>> {
    chunk.iter().map(serde_json::to_value).collect()
}
