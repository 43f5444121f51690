//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `RepositoryError` from `justlog_core::storage`.
//! Messages come from the service error's display form and never include the
//! request's key attributes.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{BuildError, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::CancellationReason;
use justlog_core::storage::RepositoryError;

const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";
const TRANSACTION_CONFLICT: &str = "TransactionConflict";
const VALIDATION_EXCEPTION: &str = "ValidationException";

/// Map a GetItem SDK error to RepositoryError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> RepositoryError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            RepositoryError::unavailable("GetItem", "table not found")
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::unavailable("GetItem", "throughput exceeded, please retry")
        }
        GetItemError::RequestLimitExceeded(_) => {
            RepositoryError::unavailable("GetItem", "request limit exceeded, please retry")
        }
        GetItemError::InternalServerError(_) => {
            RepositoryError::unavailable("GetItem", "DynamoDB internal server error")
        }
        err => RepositoryError::unavailable("GetItem", err.to_string()),
    }
}

/// Map a Query SDK error to RepositoryError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> RepositoryError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            RepositoryError::unavailable("Query", "table not found")
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::unavailable("Query", "throughput exceeded, please retry")
        }
        QueryError::RequestLimitExceeded(_) => {
            RepositoryError::unavailable("Query", "request limit exceeded, please retry")
        }
        QueryError::InternalServerError(_) => {
            RepositoryError::unavailable("Query", "DynamoDB internal server error")
        }
        err if is_validation(&err) => validation(&err),
        err => RepositoryError::unavailable("Query", err.to_string()),
    }
}

/// Map a conditional entry PutItem SDK error to RepositoryError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    entity: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => RepositoryError::AlreadyExists {
            entity,
            id: id.into(),
        },
        PutItemError::ResourceNotFoundException(_) => {
            RepositoryError::unavailable("PutItem", "table not found")
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::unavailable("PutItem", "throughput exceeded, please retry")
        }
        PutItemError::RequestLimitExceeded(_) => {
            RepositoryError::unavailable("PutItem", "request limit exceeded, please retry")
        }
        PutItemError::TransactionConflictException(_) => RepositoryError::Conflict {
            entity,
            id: id.into(),
        },
        PutItemError::InternalServerError(_) => {
            RepositoryError::unavailable("PutItem", "DynamoDB internal server error")
        }
        err if is_validation(&err) => validation(&err),
        err => RepositoryError::unavailable("PutItem", err.to_string()),
    }
}

/// Map a DeleteItem SDK error to RepositoryError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    entity: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_)
        | DeleteItemError::TransactionConflictException(_) => RepositoryError::Conflict {
            entity,
            id: id.into(),
        },
        DeleteItemError::ResourceNotFoundException(_) => {
            RepositoryError::unavailable("DeleteItem", "table not found")
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::unavailable("DeleteItem", "throughput exceeded, please retry")
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            RepositoryError::unavailable("DeleteItem", "request limit exceeded, please retry")
        }
        DeleteItemError::InternalServerError(_) => {
            RepositoryError::unavailable("DeleteItem", "DynamoDB internal server error")
        }
        err => RepositoryError::unavailable("DeleteItem", err.to_string()),
    }
}

/// Map a TransactWriteItems SDK error to RepositoryError.
///
/// A cancelled transaction applied nothing. Failed conditions and conflicts
/// with other transactions mean the record changed since it was read.
pub fn map_transact_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
    entity: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(cancelled) => {
            if is_conflict(cancelled.cancellation_reasons()) {
                RepositoryError::Conflict {
                    entity,
                    id: id.into(),
                }
            } else {
                RepositoryError::unavailable(
                    "TransactWriteItems",
                    format!(
                        "transaction cancelled: {}",
                        reason_codes(cancelled.cancellation_reasons())
                    ),
                )
            }
        }
        TransactWriteItemsError::TransactionInProgressException(_) => RepositoryError::Conflict {
            entity,
            id: id.into(),
        },
        TransactWriteItemsError::ResourceNotFoundException(_) => {
            RepositoryError::unavailable("TransactWriteItems", "table not found")
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            RepositoryError::unavailable("TransactWriteItems", "throughput exceeded, please retry")
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => RepositoryError::unavailable(
            "TransactWriteItems",
            "request limit exceeded, please retry",
        ),
        TransactWriteItemsError::InternalServerError(_) => {
            RepositoryError::unavailable("TransactWriteItems", "DynamoDB internal server error")
        }
        err => RepositoryError::unavailable("TransactWriteItems", err.to_string()),
    }
}

/// Map a CreateTable SDK error to RepositoryError.
pub fn map_create_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<CreateTableError, R>,
    table_name: &str,
) -> RepositoryError {
    match err.into_service_error() {
        CreateTableError::ResourceInUseException(_) => RepositoryError::AlreadyExists {
            entity: "Table",
            id: table_name.to_string(),
        },
        err => RepositoryError::unavailable("CreateTable", err.to_string()),
    }
}

/// Map a request builder error. Only reachable when a required field is unset.
pub fn map_build_error(operation: &'static str, err: BuildError) -> RepositoryError {
    RepositoryError::unavailable(operation, format!("invalid request: {err}"))
}

/// The service rejected the request itself, e.g. a number it cannot store.
fn is_validation(err: &impl ProvideErrorMetadata) -> bool {
    err.code() == Some(VALIDATION_EXCEPTION)
}

fn validation(err: &impl ProvideErrorMetadata) -> RepositoryError {
    RepositoryError::Validation(
        err.message()
            .unwrap_or("request rejected by DynamoDB")
            .to_string(),
    )
}

/// Whether cancellation was caused by a failed condition or a concurrent
/// transaction, as opposed to throttling or a service fault.
pub fn is_conflict(reasons: &[CancellationReason]) -> bool {
    reasons.iter().any(|reason| {
        matches!(
            reason.code(),
            Some(CONDITIONAL_CHECK_FAILED) | Some(TRANSACTION_CONFLICT)
        )
    })
}

fn reason_codes(reasons: &[CancellationReason]) -> String {
    reasons
        .iter()
        .filter_map(|reason| reason.code())
        .filter(|code| *code != "None")
        .collect::<Vec<_>>()
        .join(", ")
}
