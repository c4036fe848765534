use serde::{Deserialize, Serialize};

/// How a storage status code is treated by the retry controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Success,
    /// Throughput exceeded; retried with backoff
    Throttled,
    /// Anything else; recorded as failed, never retried
    Permanent,
}

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_FAILED_DEPENDENCY: u16 = 424;
pub const STATUS_BAD_REQUEST: u16 = 400;

pub struct ErrorUtils;

impl ErrorUtils {
    pub fn categorize_status(status_code: u16) -> ErrorCategory {
        match status_code {
            200..=299 => ErrorCategory::Success,
            STATUS_TOO_MANY_REQUESTS => ErrorCategory::Throttled,
            _ => ErrorCategory::Permanent,
        }
    }

    pub fn describe_status(status_code: u16) -> &'static str {
        match status_code {
            200..=299 => "success",
            STATUS_BAD_REQUEST => "bad request",
            401 => "unauthorized",
            403 => "forbidden",
            404 => "not found",
            408 => "request timeout",
            STATUS_CONFLICT => "conflict",
            413 => "request entity too large",
            STATUS_FAILED_DEPENDENCY => "failed dependency",
            STATUS_TOO_MANY_REQUESTS => "too many requests",
            500 => "internal server error",
            503 => "service unavailable",
            _ => "unexpected status",
        }
    }
}
