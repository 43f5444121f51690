mod error;
mod http_mapping;
pub mod keys;
mod traits;
mod types;

pub use error::{RepositoryError, Result, TimeWindowError};
pub use http_mapping::{credential_error_to_status_code, repository_error_to_status_code};
pub use traits::{CredentialRepository, EntryRepository};
pub use types::TimeWindow;
