//! Throttling-aware retry controller
//!
//! Each chunk moves `Attempting -> {Succeeded, PermanentlyFailed, Throttled}`.
//! A throttled chunk waits out its backoff and is attempted again until the
//! attempt ceiling is reached, after which it is permanently failed. Any
//! non-throttling failure ends the chunk immediately.
//!
//! Retrying a whole chunk is only safe while the service applies a
//! transactional batch atomically. A backend that can commit part of a batch
//! before answering 429 would see already-created items resubmitted; the
//! `SkipExisting` conflict policy exists for that case.

use super::executor::TransactionalBatchExecutor;
use super::types::{AttemptResult, BatchOutcome, ChunkReport, ChunkState};
use crate::config::{ConflictPolicy, RetryConfig};
use crate::core::store::PartitionKey;
use crate::utils::error::Result;
use rand::Rng;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Exponential backoff between throttled attempts
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base_delay: Duration,
    multiplier: f64,
    max_delay: Option<Duration>,
    jitter: bool,
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, multiplier: f64) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay: None,
            jitter: false,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry `retry` (1-indexed)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let mut millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);

        if self.jitter {
            let factor: f64 = rand::thread_rng().gen_range(-0.1..=0.1);
            millis += millis * factor;
        }

        let delay = Duration::from_millis(millis.max(0.0) as u64);
        match self.max_delay {
            Some(max_delay) => delay.min(max_delay),
            None => delay,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        let policy = Self::new(config.base_delay(), config.backoff_multiplier)
            .with_jitter(config.jitter);
        match config.max_delay() {
            Some(max_delay) => policy.with_max_delay(max_delay),
            None => policy,
        }
    }
}

/// Drives one chunk to a terminal state
#[derive(Clone)]
pub struct RetryController {
    executor: TransactionalBatchExecutor,
    backoff: BackoffPolicy,
    max_attempts: u32,
    conflict_policy: ConflictPolicy,
    cancel: CancellationToken,
}

impl RetryController {
    pub fn new(
        executor: TransactionalBatchExecutor,
        backoff: BackoffPolicy,
        max_attempts: u32,
    ) -> Self {
        Self {
            executor,
            backoff,
            max_attempts: max_attempts.max(1),
            conflict_policy: ConflictPolicy::Strict,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_conflict_policy(mut self, conflict_policy: ConflictPolicy) -> Self {
        self.conflict_policy = conflict_policy;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `documents` to a terminal state
    ///
    /// The returned report accounts for every document exactly once. Only an
    /// unreachable service is returned as an error.
    pub async fn run(
        &self,
        partition_key: &PartitionKey,
        documents: Vec<Value>,
    ) -> Result<ChunkReport> {
        let mut pending = documents;
        let mut report = ChunkReport::new(ChunkState::Attempting);

        loop {
            if self.cancel.is_cancelled() {
                debug!(
                    partition_key = %partition_key,
                    items = pending.len(),
                    "Chunk cancelled before attempt"
                );
                report.state = ChunkState::Cancelled;
                report.cancelled = pending.len();
                return Ok(report);
            }

            report.state = ChunkState::Attempting;
            report.attempts += 1;

            match self.executor.execute(partition_key, &pending).await? {
                AttemptResult::Completed(BatchOutcome::Success {
                    cost_units,
                    item_count,
                }) => {
                    report.state = ChunkState::Succeeded;
                    report.cost_units = cost_units;
                    report.succeeded += item_count;
                    return Ok(report);
                }
                AttemptResult::Completed(BatchOutcome::Failure {
                    reason,
                    status_code,
                    activity_id,
                    item_count,
                    failures,
                }) => {
                    let retry_without_existing =
                        self.conflict_policy == ConflictPolicy::SkipExisting
                            && report.throttled > 0
                            && failures.only_conflicts();

                    if retry_without_existing {
                        let existing = failures.conflicts.len();
                        debug!(
                            partition_key = %partition_key,
                            existing,
                            "Skipping items created by an earlier attempt"
                        );
                        report.succeeded += existing;
                        pending = remove_positions(pending, &failures.conflicts);

                        if pending.is_empty() {
                            report.state = ChunkState::Succeeded;
                            return Ok(report);
                        }
                        if report.attempts < self.max_attempts {
                            continue;
                        }
                        report.state = ChunkState::PermanentlyFailed;
                        report.failed += pending.len();
                        error!(
                            partition_key = %partition_key,
                            attempts = report.attempts,
                            items = pending.len(),
                            "Attempt budget exhausted while resubmitting chunk"
                        );
                        return Ok(report);
                    }

                    error!(
                        partition_key = %partition_key,
                        status = ?status_code,
                        activity_id = ?activity_id,
                        items = item_count,
                        "Error processing batch: {}",
                        reason
                    );
                    report.state = ChunkState::PermanentlyFailed;
                    report.failed += item_count;
                    report.conflicted += failures.conflicts.len();
                    return Ok(report);
                }
                AttemptResult::Throttled(throttled) => {
                    report.state = ChunkState::Throttled;
                    report.throttled += 1;

                    if report.attempts >= self.max_attempts {
                        warn!(
                            partition_key = %partition_key,
                            attempts = report.attempts,
                            items = pending.len(),
                            "Throttled on final attempt, giving up: {}",
                            throttled.message
                        );
                        report.state = ChunkState::PermanentlyFailed;
                        report.failed += pending.len();
                        return Ok(report);
                    }

                    let mut delay = self.backoff.delay_for(report.attempts);
                    if let Some(retry_after) = throttled.retry_after {
                        delay = delay.max(retry_after);
                    }
                    warn!(
                        partition_key = %partition_key,
                        attempt = report.attempts,
                        ?delay,
                        "Throttled, backing off"
                    );

                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            debug!(
                                partition_key = %partition_key,
                                "Backoff interrupted by cancellation"
                            );
                            report.state = ChunkState::Cancelled;
                            report.cancelled = pending.len();
                            return Ok(report);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

fn remove_positions(documents: Vec<Value>, positions: &[usize]) -> Vec<Value> {
    documents
        .into_iter()
        .enumerate()
        .filter(|(position, _)| !positions.contains(position))
        .map(|(_, document)| document)
        .collect()
}
