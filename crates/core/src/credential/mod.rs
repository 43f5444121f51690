mod functions;
mod planning;
mod types;

pub use functions::{digest_key, generate_raw_key, RAW_KEY_BYTES};
pub use planning::{plan_issue, plan_revoke, CredentialWrite, Precondition, StoredApiKey};
pub use types::{KeyDigest, RawApiKey};
