//! Core functionality for the batch writer
//!
//! `store` defines the storage seam and an in-process emulator; `batch` holds
//! the partitioned insert engine built on top of it.

pub mod batch;
pub mod store;

pub use batch::PartitionedWriter;
pub use store::{DocumentStore, InMemoryDocumentStore, PartitionKey};
