//! Partitioned transactional batch writing
//!
//! Items are grouped by partition key, each group is cut into chunks no larger
//! than the provider's per-transaction limit, and every chunk is submitted as
//! one atomic batch. Throttled chunks are retried with exponential backoff;
//! groups run concurrently and report into a shared aggregator.

mod aggregator;
mod chunking;
mod coordinator;
mod executor;
mod grouping;
mod retry;
mod types;


// Re-export all public types
pub use aggregator::ResultAggregator;
pub use chunking::{Chunks, chunk_group};
pub use coordinator::PartitionedWriter;
pub use executor::{TransactionalBatchExecutor, classify_response};
pub use grouping::{group_by_partition, try_group_by_partition};
pub use retry::{BackoffPolicy, RetryController};
pub use types::{
    AggregateResult, AttemptResult, BatchOutcome, ChunkReport, ChunkState, InsertSummary,
    ItemFailures, PartitionGroup, Throttled,
};
