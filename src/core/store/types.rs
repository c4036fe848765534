//! Storage request and response types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Value routing an item to its logical partition and scoping its batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&String> for PartitionKey {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

macro_rules! partition_key_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PartitionKey {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

partition_key_from_integer!(i32, i64, u32, u64, usize);

/// Result of a single operation inside a transactional batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    /// HTTP-style status of this operation
    pub status_code: u16,
    /// Request units charged for this operation
    pub request_charge: f64,
}

impl OperationResult {
    pub fn new(status_code: u16, request_charge: f64) -> Self {
        Self {
            status_code,
            request_charge,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Response to one executed transactional batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// HTTP-style status of the batch as a whole
    pub status_code: u16,
    /// Request units charged for the call
    pub request_charge: f64,
    /// Service error message for non-success statuses
    pub error_message: Option<String>,
    /// Service-side correlation id
    pub activity_id: Option<String>,
    /// Minimum wait the service asks for before retrying
    pub retry_after: Option<Duration>,
    /// Per-operation results, in submission order, when the service reports them
    pub operations: Vec<OperationResult>,
}

impl BatchResponse {
    /// Successful response with the given charge
    pub fn success(request_charge: f64) -> Self {
        Self {
            status_code: 200,
            request_charge,
            error_message: None,
            activity_id: None,
            retry_after: None,
            operations: Vec::new(),
        }
    }

    /// Throttled response
    pub fn throttled(retry_after: Option<Duration>) -> Self {
        Self {
            status_code: 429,
            request_charge: 0.0,
            error_message: Some("Request rate is large".to_string()),
            activity_id: None,
            retry_after,
            operations: Vec::new(),
        }
    }

    /// Failed response with a status and message
    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            request_charge: 0.0,
            error_message: Some(message.into()),
            activity_id: None,
            retry_after: None,
            operations: Vec::new(),
        }
    }

    pub fn with_operations(mut self, operations: Vec<OperationResult>) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_activity_id(mut self, activity_id: impl Into<String>) -> Self {
        self.activity_id = Some(activity_id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
