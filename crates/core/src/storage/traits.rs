use async_trait::async_trait;

use crate::credential::RawApiKey;
use crate::entry::{Entry, EntryType};

use super::{Result, TimeWindow};

/// Issues, resolves and revokes the single API key each user may hold.
///
/// Implementations persist only the key digest. The key record and its
/// lookup record are always written and deleted together in one atomic
/// multi-item commit.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Replaces any existing key for the user and returns the new raw key.
    ///
    /// This is the only time the raw key is available.
    async fn issue_api_key(&self, user_id: &str) -> Result<RawApiKey>;

    /// Resolves a raw key to its owning user id with a point read.
    ///
    /// Fails with `NotFound` for unknown keys and `Corrupt` when the lookup
    /// record has no usable owner.
    async fn resolve_api_key(&self, raw_key: &str) -> Result<String>;

    /// Revokes the user's key. Succeeds when there is nothing to revoke or
    /// the stored record is malformed.
    async fn revoke_api_key(&self, user_id: &str) -> Result<()>;
}

/// Append-only storage of log entries.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Stores a new entry. Entries are immutable: an existing
    /// `(user_id, sort_id)` yields `AlreadyExists`.
    async fn append_entry(&self, entry: &Entry) -> Result<()>;

    /// Gets an entry by its key.
    async fn get_entry(&self, user_id: &str, sort_id: &str) -> Result<Option<Entry>>;

    /// Gets the user's entries of one type within the window, newest first.
    async fn query_entries(
        &self,
        user_id: &str,
        entry_type: EntryType,
        window: TimeWindow,
    ) -> Result<Vec<Entry>>;

    /// Deletes an entry by its key. Deleting a missing entry succeeds.
    async fn delete_entry(&self, user_id: &str, sort_id: &str) -> Result<()>;
}
