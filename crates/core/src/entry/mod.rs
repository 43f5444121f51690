mod error;
mod requests;
mod types;

pub use error::EntryError;
pub use requests::{parse_timestamp, LogEntryRequest};
pub use types::{Entry, EntryType, Measurements};
