//! # partition-writer-rs
//!
//! Bulk insertion of large item sets into a partitioned, throughput-limited
//! document store.
//!
//! ## Features
//!
//! - **Partition grouping**: items are grouped by a caller-supplied key
//! - **Transactional chunks**: each group is cut into atomic batches of at
//!   most 100 operations
//! - **Throttling backoff**: throttled chunks are retried with exponential
//!   backoff up to a configurable attempt ceiling
//! - **Bounded fan-out**: partition groups run concurrently under a
//!   semaphore, with cooperative cancellation
//! - **Aggregated accounting**: request charge, successes and failures are
//!   totalled across all chunks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use partition_writer::{Config, InMemoryDocumentStore, PartitionedWriter};
//! use serde::Serialize;
//! use std::sync::Arc;
//!
//! #[derive(Serialize)]
//! struct Post {
//!     id: String,
//!     author: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryDocumentStore::default());
//!     let writer = PartitionedWriter::new(store, Config::default())?;
//!
//!     let posts = vec![
//!         Post { id: "1".into(), author: "ada".into() },
//!         Post { id: "2".into(), author: "grace".into() },
//!     ];
//!     let summary = writer
//!         .insert_partitioned(posts, |post| post.author.clone())
//!         .await?;
//!
//!     println!(
//!         "{} written, {} failed, {:.2} RU in {}",
//!         summary.succeeded,
//!         summary.failed,
//!         summary.total_cost_units,
//!         summary.elapsed_display()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod fixtures;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use core::batch::{AggregateResult, BatchOutcome, ChunkState, InsertSummary, PartitionedWriter};
pub use core::store::{
    BatchResponse, DocumentStore, InMemoryDocumentStore, InMemoryStoreConfig, OperationResult,
    PartitionKey, TransactionalBatch,
};
pub use utils::error::{BatchError, Result, StoreError};
pub use utils::logging::init_logging;

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
