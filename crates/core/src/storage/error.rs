use thiserror::Error;

use crate::entry::EntryError;

/// Errors that can occur when constructing a time window.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeWindowError {
    #[error("Invalid time window: from must be before or equal to to")]
    InvalidRange,
}

/// Errors that can occur during repository operations.
///
/// Messages name the entity and, where known, the user id or sort id. They
/// never carry a raw API key or its digest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },
    #[error("{entity} was modified concurrently: {id}")]
    Conflict { entity: &'static str, id: String },
    #[error("Corrupt {entity} record: {reason}")]
    Corrupt {
        entity: &'static str,
        reason: String,
    },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Store unavailable during {operation}: {message}")]
    StoreUnavailable {
        operation: &'static str,
        message: String,
    },
}

impl RepositoryError {
    pub fn unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            operation,
            message: message.into(),
        }
    }
}

impl From<EntryError> for RepositoryError {
    fn from(err: EntryError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TimeWindowError> for RepositoryError {
    fn from(err: TimeWindowError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_error_display() {
        assert_eq!(
            TimeWindowError::InvalidRange.to_string(),
            "Invalid time window: from must be before or equal to to"
        );
    }

    #[test]
    fn test_not_found_display() {
        let error = RepositoryError::NotFound {
            entity: "ApiKeyLookup",
        };
        assert_eq!(error.to_string(), "ApiKeyLookup not found");
    }

    #[test]
    fn test_already_exists_display() {
        let error = RepositoryError::AlreadyExists {
            entity: "Entry",
            id: "u1/food#2026-02-05T08:00:00Z".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Entry already exists: u1/food#2026-02-05T08:00:00Z"
        );
    }

    #[test]
    fn test_corrupt_display() {
        let error = RepositoryError::Corrupt {
            entity: "ApiKeyLookup",
            reason: "missing owner".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Corrupt ApiKeyLookup record: missing owner"
        );
    }

    #[test]
    fn test_store_unavailable_display() {
        let error = RepositoryError::unavailable("Query", "Throughput exceeded, please retry");
        assert_eq!(
            error.to_string(),
            "Store unavailable during Query: Throughput exceeded, please retry"
        );
    }

    #[test]
    fn test_entry_error_becomes_validation() {
        let error: RepositoryError = EntryError::MissingUserId.into();
        assert_eq!(
            error,
            RepositoryError::Validation("user id is required".to_string())
        );
    }
}
