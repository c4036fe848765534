//! Utility modules for the batch writer
//!
//! - **error**: Error types and storage status classification
//! - **logging**: Subscriber setup

pub mod error;
pub mod logging;

pub use error::{ErrorCategory, ErrorUtils};
pub use logging::init_logging;

use std::time::Duration;

/// Format a duration as `hh:mm:ss.cc`
pub fn format_elapsed(duration: Duration) -> String {
    let total_centis = duration.as_millis() / 10;
    let centis = total_centis % 100;
    let total_secs = total_centis / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02}.{:02}", hours, mins, secs, centis)
}

/// Format a request charge with two decimals
pub fn format_cost_units(cost_units: f64) -> String {
    format!("{:.2}", cost_units)
}
