//! Error Handling utilities
//!
//! This module provides the crate error types and storage status classification.

pub mod error;
pub mod utils;

// Re-export commonly used types and functions
pub use error::*;
pub use utils::{ErrorCategory, ErrorUtils};
