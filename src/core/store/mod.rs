//! Document store abstraction and in-memory emulator

mod memory;
mod traits;
mod types;

pub use memory::{InMemoryDocumentStore, InMemoryStoreConfig};
pub use traits::{DocumentStore, TransactionalBatch};
pub use types::{BatchResponse, OperationResult, PartitionKey};
