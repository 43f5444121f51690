//! Pure functions for mapping repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `Conflict` -> 409 (Conflict)
/// - `Corrupt` -> 500 (Internal Server Error)
/// - `Validation` -> 400 (Bad Request)
/// - `StoreUnavailable` -> 503 (Service Unavailable)
///
/// # Examples
///
/// ```
/// use justlog_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::Validation("user id is required".to_string());
/// assert_eq!(repository_error_to_status_code(&error), 400);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::Conflict { .. } => 409,
        RepositoryError::Corrupt { .. } => 500,
        RepositoryError::Validation(_) => 400,
        RepositoryError::StoreUnavailable { .. } => 503,
    }
}

/// Maps a failed API key resolution to an HTTP status code.
///
/// Unknown and corrupt keys are both an authentication rejection (401), so
/// callers cannot tell a malformed key from an unknown one. Infrastructure
/// faults keep their usual mapping.
pub fn credential_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } | RepositoryError::Corrupt { .. } => 401,
        RepositoryError::Validation(_) => 401,
        other => repository_error_to_status_code(other),
    }
}
