//! Concurrency and cancellation integration tests

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::common::assertions::SummaryAssertions;
    use crate::common::{
        FailingStore, FailureMode, RandomDelayStore, fast_config, items_across_partitions,
    };
    use futures::future::join_all;
    use partition_writer::{BatchError, InsertSummary, PartitionedWriter};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    async fn run_random_delays(max_concurrency: usize) -> (InsertSummary, RandomDelayStore) {
        let store = RandomDelayStore::new(5, 1.0);
        let mut config = fast_config();
        config.batch.chunk_size = 8;
        config.concurrency.max_concurrent_partitions = max_concurrency;
        let writer = PartitionedWriter::new(Arc::new(store.clone()), config).unwrap();

        let summary = writer
            .insert_partitioned(items_across_partitions(1000, 50), |item| item.pk.clone())
            .await
            .unwrap();
        (summary, store)
    }

    /// Totals do not depend on how partition tasks interleave
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_totals_are_deterministic_across_runs() {
        let runs = join_all((0..5).map(|_| run_random_delays(64))).await;

        for (summary, store) in &runs {
            assert_eq!(summary.succeeded, 1000);
            assert_eq!(summary.failed, 0);
            assert_eq!(summary.partitions, 50);
            assert_approx_eq!(summary.total_cost_units, 1000.0);
            summary.assert_accounted();
            assert_eq!(store.batches().len(), 150);
        }

        let first = runs[0].0.total_cost_units;
        for (summary, _) in &runs {
            assert_eq!(summary.total_cost_units, first);
        }
    }

    /// Chunks of one partition are submitted strictly in order even while
    /// partitions run in parallel
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_chunks_within_partition_stay_ordered() {
        let (_, store) = run_random_delays(64).await;

        let mut last_seen: HashMap<String, String> = HashMap::new();
        for batch in store.batches() {
            let first = batch.ids[0].clone();
            if let Some(previous) = last_seen.get(&batch.partition_key) {
                assert!(previous < &first, "{} submitted after {}", first, previous);
            }
            last_seen.insert(batch.partition_key, batch.ids[batch.ids.len() - 1].clone());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_partition_fan_out_is_bounded() {
        let (summary, store) = run_random_delays(4).await;
        assert_eq!(summary.succeeded, 1000);
        assert!(
            store.peak_in_flight() <= 4,
            "peak {}",
            store.peak_in_flight()
        );
    }

    // ==================== Failures ====================

    /// A transport fault fails only the affected partition's chunks
    #[tokio::test]
    async fn test_transport_failure_is_isolated() {
        let store = FailingStore::new(["pk-001"], FailureMode::Transport);
        let writer = PartitionedWriter::new(Arc::new(store.clone()), fast_config()).unwrap();

        let summary = writer
            .insert_partitioned(items_across_partitions(30, 3), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(summary.failed, 10);
        assert_eq!(summary.succeeded, 20);
        assert_approx_eq!(summary.total_cost_units, 2.0);
        summary.assert_accounted();
    }

    #[tokio::test]
    async fn test_rejected_status_is_not_retried() {
        let store = FailingStore::new(["pk-000", "pk-002"], FailureMode::Status(400));
        let writer = PartitionedWriter::new(Arc::new(store.clone()), fast_config()).unwrap();

        let summary = writer
            .insert_partitioned(items_across_partitions(30, 3), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(store.executions(), 3);
        assert_eq!(summary.failed, 20);
        assert_eq!(summary.succeeded, 10);
    }

    /// An unreachable service aborts the whole run with an error
    #[tokio::test]
    async fn test_unavailable_store_aborts_run() {
        let store = FailingStore::new(["pk-002"], FailureMode::Unavailable);
        let writer = PartitionedWriter::new(Arc::new(store), fast_config()).unwrap();

        let err = writer
            .insert_partitioned(items_across_partitions(30, 5), |item| item.pk.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::StoreUnavailable(_)));
    }

    // ==================== Cancellation ====================

    /// Cancelling mid-run stops new chunks; every item is still accounted for
    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_run() {
        let store = FailingStore::with_delay(
            Vec::<String>::new(),
            FailureMode::Transport,
            Duration::from_millis(50),
        );
        let mut config = fast_config();
        config.concurrency.max_concurrent_partitions = 2;
        let cancel = CancellationToken::new();
        let writer = PartitionedWriter::new(Arc::new(store.clone()), config)
            .unwrap()
            .with_cancellation(cancel.clone());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            cancel.cancel();
        });

        let summary = writer
            .insert_partitioned(items_across_partitions(30, 10), |item| item.pk.clone())
            .await
            .unwrap();

        summary.assert_accounted();
        assert!(summary.cancelled > 0);
        assert!(summary.succeeded >= 12);
        assert_eq!(summary.succeeded % 3, 0);
        assert_eq!(summary.failed, 0);
        assert!(store.executions() < 10);
    }

    #[tokio::test]
    async fn test_pre_cancelled_writer_issues_no_batches() {
        let store = FailingStore::new(Vec::<String>::new(), FailureMode::Transport);
        let writer = PartitionedWriter::new(Arc::new(store.clone()), fast_config()).unwrap();
        writer.cancellation_token().cancel();

        let summary = writer
            .insert_partitioned(items_across_partitions(20, 4), |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(summary.cancelled, 20);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(store.executions(), 0);
    }
}
