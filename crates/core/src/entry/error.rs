use thiserror::Error;

/// Errors raised while building or validating an entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("user id is required")]
    MissingUserId,

    #[error("user id uses a reserved prefix")]
    ReservedUserId,

    #[error("unknown entry type: {0}")]
    UnknownType(String),

    #[error("not an entry sort id: {0}")]
    InvalidSortId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("measurement {field} is not a storable number")]
    InvalidMeasurement { field: &'static str },
}
