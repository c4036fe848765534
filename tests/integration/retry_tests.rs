//! Throttling and retry integration tests
//!
//! These run with tokio's clock paused so multi-second backoffs complete
//! instantly while elapsed virtual time stays observable.

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::common::assertions::SummaryAssertions;
    use crate::common::{
        AlwaysThrottleStore, TestItem, ThrottleThenSucceedStore, items_across_partitions,
    };
    use async_trait::async_trait;
    use partition_writer::config::ConflictPolicy;
    use partition_writer::{
        BatchResponse, Config, DocumentStore, InMemoryDocumentStore, InMemoryStoreConfig,
        PartitionKey, PartitionedWriter, StoreError, TransactionalBatch,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn one_chunk() -> Vec<TestItem> {
        vec![TestItem::new("x", "pk"), TestItem::new("y", "pk")]
    }

    /// A chunk that is always throttled is attempted exactly `max_retries`
    /// times and then counted as failed
    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_retries() {
        let store = AlwaysThrottleStore::new();
        let writer = PartitionedWriter::new(Arc::new(store.clone()), Config::default()).unwrap();
        let started = Instant::now();

        let summary = writer
            .insert_partitioned(one_chunk(), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(store.attempts(), 5);
        assert_eq!(summary.attempts, 5);
        assert_eq!(summary.throttled_responses, 5);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded, 0);
        assert_approx_eq!(summary.total_cost_units, 0.0);
        summary.assert_accounted();
        // Waits of 2, 4, 8 and 16 seconds; none after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_retry_ceiling() {
        let store = AlwaysThrottleStore::new();
        let mut config = Config::default();
        config.batch.max_retries = 2;
        let writer = PartitionedWriter::new(Arc::new(store.clone()), config).unwrap();

        let summary = writer
            .insert_partitioned(items_across_partitions(6, 3), |item| item.pk.clone())
            .await
            .unwrap();

        // Three single-chunk groups, two attempts each
        assert_eq!(store.attempts(), 6);
        assert_eq!(summary.failed, 6);
        summary.assert_accounted();
    }

    /// Throttled twice then accepted: only the accepted attempt's charge counts
    #[tokio::test(start_paused = true)]
    async fn test_throttle_then_succeed_charges_final_attempt() {
        let store = ThrottleThenSucceedStore::new(2, 3.5);
        let writer = PartitionedWriter::new(Arc::new(store.clone()), Config::default()).unwrap();
        let started = Instant::now();

        let summary = writer
            .insert_partitioned(one_chunk(), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(store.executions(), 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.throttled_responses, 2);
        assert_approx_eq!(summary.total_cost_units, 3.5);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_hint_lengthens_wait() {
        let store = ThrottleThenSucceedStore::with_retry_after(1, 1.0, Duration::from_secs(10));
        let writer = PartitionedWriter::new(Arc::new(store.clone()), Config::default()).unwrap();
        let started = Instant::now();

        let summary = writer
            .insert_partitioned(one_chunk(), |item| item.pk.clone())
            .await
            .unwrap();

        assert!(summary.is_complete());
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_cap_limits_wait() {
        let store = ThrottleThenSucceedStore::new(3, 1.0);
        let mut config = Config::default();
        config.retry.max_delay_ms = Some(3000);
        let writer = PartitionedWriter::new(Arc::new(store.clone()), config).unwrap();
        let started = Instant::now();

        writer
            .insert_partitioned(one_chunk(), |item| item.pk.clone())
            .await
            .unwrap();

        // 2s, then 4s and 8s capped to 3s each
        assert_eq!(started.elapsed(), Duration::from_secs(8));
    }

    /// Chunks are throttled independently; each keeps its own attempt budget
    #[tokio::test(start_paused = true)]
    async fn test_every_chunk_recovers_independently() {
        let store = ThrottleThenSucceedStore::new(4, 1.0);
        let mut config = Config::default();
        config.batch.chunk_size = 10;
        let writer = PartitionedWriter::new(Arc::new(store.clone()), config).unwrap();

        let summary = writer
            .insert_partitioned(items_across_partitions(100, 4), |item| item.pk.clone())
            .await
            .unwrap();

        // 25 items per key -> 3 chunks per key, 12 chunks, 5 executions each
        assert_eq!(summary.chunks, 12);
        assert_eq!(store.executions(), 60);
        assert_eq!(summary.succeeded, 100);
        assert_approx_eq!(summary.total_cost_units, 12.0);
    }

    /// The emulator's throughput budget throttles, and backoff lets every
    /// chunk through
    #[tokio::test(start_paused = true)]
    async fn test_emulated_throughput_limit() {
        let store = InMemoryDocumentStore::new(
            InMemoryStoreConfig::default()
                .with_charge_per_item(1.0)
                .with_throughput(100.0),
        );
        let mut config = Config::default();
        config.batch.chunk_size = 50;
        let writer = PartitionedWriter::new(Arc::new(store.clone()), config).unwrap();

        let summary = writer
            .insert_partitioned(items_across_partitions(150, 3), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 150);
        assert!(summary.throttled_responses >= 1);
        assert!(store.throttled_batches() >= 1);
        assert_eq!(store.document_count(), 150);
        assert_approx_eq!(summary.total_cost_units, 150.0);
    }

    /// Commits the first batch it receives but answers it with 429, the way
    /// a backend without atomic throttling would
    #[derive(Clone)]
    struct CommitThenThrottleStore {
        inner: InMemoryDocumentStore,
        throttled_once: Arc<AtomicBool>,
    }

    struct CommitThenThrottleBatch {
        inner: Box<dyn TransactionalBatch>,
        throttled_once: Arc<AtomicBool>,
    }

    #[async_trait]
    impl TransactionalBatch for CommitThenThrottleBatch {
        fn create_item(&mut self, document: Value) -> Result<(), StoreError> {
            self.inner.create_item(document)
        }

        fn operation_count(&self) -> usize {
            self.inner.operation_count()
        }

        async fn execute(&mut self) -> Result<BatchResponse, StoreError> {
            let response = self.inner.execute().await?;
            if !self.throttled_once.swap(true, Ordering::SeqCst) {
                return Ok(BatchResponse::throttled(None));
            }
            Ok(response)
        }
    }

    impl DocumentStore for CommitThenThrottleStore {
        fn create_transactional_batch(
            &self,
            partition_key: &PartitionKey,
        ) -> Box<dyn TransactionalBatch> {
            Box::new(CommitThenThrottleBatch {
                inner: self.inner.create_transactional_batch(partition_key),
                throttled_once: self.throttled_once.clone(),
            })
        }
    }

    fn commit_then_throttle() -> CommitThenThrottleStore {
        CommitThenThrottleStore {
            inner: InMemoryDocumentStore::default(),
            throttled_once: Arc::new(AtomicBool::new(false)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_existing_completes_partially_committed_chunk() {
        let store = commit_then_throttle();
        let mut config = Config::default();
        config.batch.conflict_policy = ConflictPolicy::SkipExisting;
        let writer = PartitionedWriter::new(Arc::new(store.clone()), config).unwrap();

        let summary = writer
            .insert_partitioned(one_chunk(), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.attempts, 2);
        assert_eq!(store.inner.document_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strict_policy_fails_partially_committed_chunk() {
        let store = commit_then_throttle();
        let writer = PartitionedWriter::new(Arc::new(store.clone()), Config::default()).unwrap();

        let summary = writer
            .insert_partitioned(one_chunk(), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.conflicted, 2);
        summary.assert_accounted();
        // The documents exist even though the run reports them failed
        assert_eq!(store.inner.document_count(), 2);
    }
}
