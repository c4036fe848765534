//! Transactional batch execution
//!
//! Submits one chunk as a single atomic create batch and classifies the
//! service response into success, permanent failure, or throttling.

use super::types::{AttemptResult, BatchOutcome, ItemFailures, Throttled};
use crate::core::store::{BatchResponse, DocumentStore, PartitionKey};
use crate::utils::error::utils::{STATUS_CONFLICT, STATUS_FAILED_DEPENDENCY};
use crate::utils::error::{BatchError, ErrorCategory, ErrorUtils, Result, StoreError};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Executes chunks against a document store
#[derive(Clone)]
pub struct TransactionalBatchExecutor {
    store: Arc<dyn DocumentStore>,
}

impl TransactionalBatchExecutor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Submit `documents` as one transactional batch under `partition_key`
    ///
    /// Only an unreachable service is returned as an error; every other
    /// failure is reported as a [`BatchOutcome::Failure`].
    pub async fn execute(
        &self,
        partition_key: &PartitionKey,
        documents: &[Value],
    ) -> Result<AttemptResult> {
        let item_count = documents.len();
        let mut batch = self.store.create_transactional_batch(partition_key);

        for document in documents {
            if let Err(e) = batch.create_item(document.clone()) {
                return store_failure(e, item_count);
            }
        }

        debug!(
            partition_key = %partition_key,
            operations = batch.operation_count(),
            "Executing transactional batch"
        );

        match batch.execute().await {
            Ok(response) => Ok(classify_response(response, item_count)),
            Err(e) => store_failure(e, item_count),
        }
    }
}

fn store_failure(error: StoreError, item_count: usize) -> Result<AttemptResult> {
    match error {
        StoreError::Unavailable(message) => Err(BatchError::StoreUnavailable(message)),
        other => Ok(AttemptResult::Completed(BatchOutcome::failure(
            other.to_string(),
            item_count,
        ))),
    }
}

/// Map a service response onto an attempt result
pub fn classify_response(response: BatchResponse, item_count: usize) -> AttemptResult {
    match ErrorUtils::categorize_status(response.status_code) {
        ErrorCategory::Success => AttemptResult::Completed(BatchOutcome::Success {
            cost_units: response.request_charge,
            item_count,
        }),
        ErrorCategory::Throttled => AttemptResult::Throttled(Throttled {
            message: response
                .error_message
                .unwrap_or_else(|| ErrorUtils::describe_status(response.status_code).to_string()),
            retry_after: response.retry_after,
            activity_id: response.activity_id,
        }),
        ErrorCategory::Permanent => {
            let failures = item_failures(&response, item_count);
            let reason = response.error_message.unwrap_or_else(|| {
                format!(
                    "{} ({})",
                    ErrorUtils::describe_status(response.status_code),
                    response.status_code
                )
            });
            AttemptResult::Completed(BatchOutcome::Failure {
                reason,
                status_code: Some(response.status_code),
                activity_id: response.activity_id,
                item_count,
                failures,
            })
        }
    }
}

fn item_failures(response: &BatchResponse, item_count: usize) -> ItemFailures {
    if response.operations.len() != item_count {
        return ItemFailures::whole_chunk(item_count);
    }

    let mut failures = ItemFailures::default();
    for (position, operation) in response.operations.iter().enumerate() {
        match operation.status_code {
            STATUS_CONFLICT => failures.conflicts.push(position),
            STATUS_FAILED_DEPENDENCY => failures.dependent += 1,
            _ if operation.is_success() => {}
            _ => failures.other += 1,
        }
    }
    failures
}
