//! Configuration validation
//!
//! - `trait_def`: Core Validate trait definition
//! - `batch_validators`: Batch, retry, concurrency and logging validators
//! - `tests`: Test suite for all validators

mod batch_validators;
mod trait_def;

pub use trait_def::Validate;
