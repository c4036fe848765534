//! Configuration models

pub mod batch;
pub mod concurrency;
pub mod defaults;
pub mod logging;
pub mod retry;

pub use batch::{BatchConfig, ConflictPolicy};
pub use concurrency::ConcurrencyConfig;
pub use defaults::MAX_BATCH_OPERATIONS;
pub use logging::{LogFormat, LoggingConfig};
pub use retry::RetryConfig;
