//! Batch engine types

use crate::core::store::PartitionKey;
use crate::utils::format_elapsed;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Items sharing one partition key, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionGroup<T> {
    pub key: PartitionKey,
    pub items: Vec<T>,
}

impl<T> PartitionGroup<T> {
    pub fn new(key: PartitionKey) -> Self {
        Self {
            key,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-item breakdown of a failed transactional batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFailures {
    /// Positions within the chunk whose create hit an existing document
    pub conflicts: Vec<usize>,
    /// Operations aborted only because another operation failed
    pub dependent: usize,
    /// Operations that failed for any other reason, or the whole chunk when
    /// the service gave no per-operation detail
    pub other: usize,
}

impl ItemFailures {
    /// Failure with no per-operation breakdown
    pub fn whole_chunk(item_count: usize) -> Self {
        Self {
            conflicts: Vec::new(),
            dependent: 0,
            other: item_count,
        }
    }

    /// True when every root cause in the batch was an existing document
    pub fn only_conflicts(&self) -> bool {
        !self.conflicts.is_empty() && self.other == 0
    }
}

/// Terminal result of one execution attempt for a chunk
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// The transaction committed
    Success { cost_units: f64, item_count: usize },
    /// The transaction was rejected for a non-throttling reason
    Failure {
        reason: String,
        status_code: Option<u16>,
        activity_id: Option<String>,
        item_count: usize,
        failures: ItemFailures,
    },
}

impl BatchOutcome {
    pub fn failure(reason: impl Into<String>, item_count: usize) -> Self {
        Self::Failure {
            reason: reason.into(),
            status_code: None,
            activity_id: None,
            item_count,
            failures: ItemFailures::whole_chunk(item_count),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn item_count(&self) -> usize {
        match self {
            Self::Success { item_count, .. } | Self::Failure { item_count, .. } => *item_count,
        }
    }
}

/// The service refused the attempt because throughput was exceeded
#[derive(Debug, Clone, PartialEq)]
pub struct Throttled {
    pub message: String,
    pub retry_after: Option<Duration>,
    pub activity_id: Option<String>,
}

/// What a single executor call produced
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult {
    Completed(BatchOutcome),
    Throttled(Throttled),
}

/// Lifecycle of one chunk inside the retry controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkState {
    Attempting,
    Throttled,
    Succeeded,
    PermanentlyFailed,
    Cancelled,
}

impl ChunkState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::PermanentlyFailed | Self::Cancelled
        )
    }
}

/// Terminal accounting for one chunk, recorded once
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReport {
    pub state: ChunkState,
    pub attempts: u32,
    pub throttled: u32,
    pub cost_units: f64,
    pub succeeded: usize,
    pub failed: usize,
    pub conflicted: usize,
    pub cancelled: usize,
}

impl ChunkReport {
    pub(crate) fn new(state: ChunkState) -> Self {
        Self {
            state,
            attempts: 0,
            throttled: 0,
            cost_units: 0.0,
            succeeded: 0,
            failed: 0,
            conflicted: 0,
            cancelled: 0,
        }
    }

    /// Items this report accounts for
    pub fn item_count(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }
}

/// Aggregated counters of one run, read after all workers have joined
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub total_cost_units: f64,
    pub succeeded: u64,
    pub failed: u64,
    /// Items failed because they already existed (included in `failed`)
    pub conflicted: u64,
    /// Items never written because the run was cancelled
    pub cancelled: u64,
    pub throttled_responses: u64,
    pub attempts: u64,
    pub chunks: u64,
}

impl AggregateResult {
    /// Items the run accounted for
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed + self.cancelled
    }
}

/// Final report returned to the caller of a partitioned insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertSummary {
    pub total_items: usize,
    pub partitions: usize,
    pub total_cost_units: f64,
    pub succeeded: u64,
    pub failed: u64,
    pub conflicted: u64,
    pub cancelled: u64,
    pub throttled_responses: u64,
    pub attempts: u64,
    pub chunks: u64,
    pub elapsed: Duration,
}

impl InsertSummary {
    pub fn new(
        total_items: usize,
        partitions: usize,
        aggregate: AggregateResult,
        elapsed: Duration,
    ) -> Self {
        Self {
            total_items,
            partitions,
            total_cost_units: aggregate.total_cost_units,
            succeeded: aggregate.succeeded,
            failed: aggregate.failed,
            conflicted: aggregate.conflicted,
            cancelled: aggregate.cancelled,
            throttled_responses: aggregate.throttled_responses,
            attempts: aggregate.attempts,
            chunks: aggregate.chunks,
            elapsed,
        }
    }

    /// Elapsed wall-clock time as `hh:mm:ss.cc`
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed)
    }

    /// True when every input item was written
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.total_items as u64
    }

    /// Emit the summary through `tracing`
    pub fn log(&self) {
        info!(
            total_items = self.total_items,
            partitions = self.partitions,
            chunks = self.chunks,
            succeeded = self.succeeded,
            failed = self.failed,
            conflicted = self.conflicted,
            cancelled = self.cancelled,
            throttled = self.throttled_responses,
            request_charge = self.total_cost_units,
            elapsed = %self.elapsed_display(),
            "Batch insert complete"
        );
    }
}
