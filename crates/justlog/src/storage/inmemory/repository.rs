//! In-memory repository implementation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::SubsecRound;
use tokio::sync::RwLock;

use justlog_core::credential::{
    digest_key, generate_raw_key, plan_issue, plan_revoke, CredentialWrite, Precondition,
    RawApiKey, StoredApiKey,
};
use justlog_core::entry::{Entry, EntryType};
use justlog_core::storage::{
    keys, CredentialRepository, EntryRepository, RepositoryError, Result, TimeWindow,
};

/// A record in the emulated table.
///
/// Attributes that a corrupt record could lack are `Option`s.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    ApiKey { key_hash: Option<String> },
    ApiKeyLookup { owner: Option<String> },
    Entry(Entry),
}

/// `(uid, sk)`
type TableKey = (String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Absent,
    Present,
    KeyHashEquals(String),
}

impl Condition {
    fn holds(&self, current: Option<&Record>) -> bool {
        match self {
            Condition::Absent => current.is_none(),
            Condition::Present => current.is_some(),
            Condition::KeyHashEquals(expected) => matches!(
                current,
                Some(Record::ApiKey { key_hash: Some(hash) }) if hash == expected
            ),
        }
    }
}

impl From<Precondition> for Condition {
    fn from(precondition: Precondition) -> Self {
        match precondition {
            Precondition::Absent => Condition::Absent,
            Precondition::Present => Condition::Present,
            Precondition::KeyHashEquals(digest) => {
                Condition::KeyHashEquals(digest.as_str().to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
enum WriteOp {
    Put {
        key: TableKey,
        record: Record,
        condition: Option<Condition>,
    },
    Delete {
        key: TableKey,
        condition: Option<Condition>,
    },
}

impl WriteOp {
    fn key(&self) -> &TableKey {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key, .. } => key,
        }
    }

    fn condition(&self) -> Option<&Condition> {
        match self {
            WriteOp::Put { condition, .. } | WriteOp::Delete { condition, .. } => {
                condition.as_ref()
            }
        }
    }
}

impl From<CredentialWrite> for WriteOp {
    fn from(write: CredentialWrite) -> Self {
        match write {
            CredentialWrite::PutApiKey {
                user_id,
                digest,
                precondition,
            } => WriteOp::Put {
                key: api_key_key(&user_id),
                record: Record::ApiKey {
                    key_hash: Some(digest.as_str().to_string()),
                },
                condition: Some(precondition.into()),
            },
            CredentialWrite::DeleteApiKey {
                user_id,
                precondition,
            } => WriteOp::Delete {
                key: api_key_key(&user_id),
                condition: Some(precondition.into()),
            },
            CredentialWrite::PutLookup { digest, user_id } => WriteOp::Put {
                key: (
                    keys::api_key_lookup_pk(&digest),
                    keys::api_key_lookup_sk(&digest),
                ),
                record: Record::ApiKeyLookup {
                    owner: Some(user_id),
                },
                condition: Some(Condition::Absent),
            },
            CredentialWrite::DeleteLookup { digest } => WriteOp::Delete {
                key: (
                    keys::api_key_lookup_pk(&digest),
                    keys::api_key_lookup_sk(&digest),
                ),
                condition: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitError {
    ConditionFailed,
    Unavailable,
}

fn api_key_key(user_id: &str) -> TableKey {
    (keys::api_key_pk(user_id), keys::api_key_sk().to_string())
}

/// In-memory storage backend.
///
/// Data is not persisted and will be lost when the repository is dropped.
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    table: Arc<RwLock<BTreeMap<TableKey, Record>>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next write commit fail before applying anything, the way a
    /// store outage or a crash mid-request would.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Checks every condition, then applies every write. Nothing is applied
    /// if any condition fails.
    async fn commit(&self, ops: Vec<WriteOp>) -> std::result::Result<(), CommitError> {
        let mut table = self.table.write().await;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(CommitError::Unavailable);
        }

        for op in &ops {
            if let Some(condition) = op.condition() {
                if !condition.holds(table.get(op.key())) {
                    return Err(CommitError::ConditionFailed);
                }
            }
        }

        for op in ops {
            match op {
                WriteOp::Put { key, record, .. } => {
                    table.insert(key, record);
                }
                WriteOp::Delete { key, .. } => {
                    table.remove(&key);
                }
            }
        }

        Ok(())
    }

    async fn commit_credential_writes(
        &self,
        operation: &'static str,
        user_id: &str,
        writes: Vec<CredentialWrite>,
    ) -> Result<()> {
        self.commit(writes.into_iter().map(WriteOp::from).collect())
            .await
            .map_err(|err| match err {
                CommitError::ConditionFailed => RepositoryError::Conflict {
                    entity: "ApiKey",
                    id: user_id.to_string(),
                },
                CommitError::Unavailable => {
                    RepositoryError::unavailable(operation, "commit failed")
                }
            })
    }

    async fn stored_api_key(&self, user_id: &str) -> StoredApiKey {
        let table = self.table.read().await;
        match table.get(&api_key_key(user_id)) {
            None => StoredApiKey::Absent,
            Some(Record::ApiKey { key_hash }) => StoredApiKey::classify(true, key_hash.as_deref()),
            Some(_) => StoredApiKey::Malformed,
        }
    }
}

// ============================================================================
// CredentialRepository implementation
// ============================================================================

#[async_trait]
impl CredentialRepository for InMemoryRepository {
    async fn issue_api_key(&self, user_id: &str) -> Result<RawApiKey> {
        keys::validate_user_id(user_id)?;

        let current = self.stored_api_key(user_id).await;
        let raw_key = generate_raw_key();
        let writes = plan_issue(user_id, &current, digest_key(raw_key.as_str()));

        self.commit_credential_writes("IssueApiKey", user_id, writes)
            .await?;

        tracing::info!(
            user_id,
            replaced = matches!(current, StoredApiKey::Active(_)),
            "Issued API key"
        );
        Ok(raw_key)
    }

    async fn resolve_api_key(&self, raw_key: &str) -> Result<String> {
        let digest = digest_key(raw_key);
        let key = (
            keys::api_key_lookup_pk(&digest),
            keys::api_key_lookup_sk(&digest),
        );

        let table = self.table.read().await;
        match table.get(&key) {
            None => Err(RepositoryError::NotFound {
                entity: "ApiKeyLookup",
            }),
            Some(Record::ApiKeyLookup { owner: Some(owner) }) if !owner.is_empty() => {
                Ok(owner.clone())
            }
            Some(_) => Err(RepositoryError::Corrupt {
                entity: "ApiKeyLookup",
                reason: "missing or invalid owner".to_string(),
            }),
        }
    }

    async fn revoke_api_key(&self, user_id: &str) -> Result<()> {
        keys::validate_user_id(user_id)?;

        let current = self.stored_api_key(user_id).await;
        if current == StoredApiKey::Malformed {
            tracing::warn!(user_id, "Skipping revoke of malformed API key record");
        }

        let writes = plan_revoke(user_id, &current);
        if writes.is_empty() {
            return Ok(());
        }

        self.commit_credential_writes("RevokeApiKey", user_id, writes)
            .await?;

        tracing::info!(user_id, "Revoked API key");
        Ok(())
    }
}

// ============================================================================
// EntryRepository implementation
// ============================================================================

#[async_trait]
impl EntryRepository for InMemoryRepository {
    async fn append_entry(&self, entry: &Entry) -> Result<()> {
        entry.validate()?;

        let sort_id = entry.sort_id();
        // Stored at the sort key's whole-second precision.
        let stored = Entry {
            created_at: entry.created_at.trunc_subsecs(0),
            ..entry.clone()
        };
        let op = WriteOp::Put {
            key: (keys::entry_pk(&entry.user_id), sort_id.clone()),
            record: Record::Entry(stored),
            condition: Some(Condition::Absent),
        };

        self.commit(vec![op]).await.map_err(|err| match err {
            CommitError::ConditionFailed => RepositoryError::AlreadyExists {
                entity: "Entry",
                id: format!("{}/{}", entry.user_id, sort_id),
            },
            CommitError::Unavailable => RepositoryError::unavailable("PutItem", "commit failed"),
        })
    }

    async fn get_entry(&self, user_id: &str, sort_id: &str) -> Result<Option<Entry>> {
        keys::validate_user_id(user_id)?;
        keys::validate_entry_sk(sort_id)?;

        let table = self.table.read().await;
        match table.get(&(keys::entry_pk(user_id), sort_id.to_string())) {
            Some(Record::Entry(entry)) => Ok(Some(entry.clone())),
            _ => Ok(None),
        }
    }

    async fn query_entries(
        &self,
        user_id: &str,
        entry_type: EntryType,
        window: TimeWindow,
    ) -> Result<Vec<Entry>> {
        keys::validate_user_id(user_id)?;

        let pk = keys::entry_pk(user_id);
        let (lower, upper) = window.sort_bounds(entry_type);

        let table = self.table.read().await;
        let entries: Vec<Entry> = table
            .range((pk.clone(), lower)..=(pk, upper))
            .rev()
            .filter_map(|(_, record)| match record {
                Record::Entry(entry) => Some(entry.clone()),
                _ => None,
            })
            .collect();

        tracing::debug!(
            user_id,
            entry_type = %entry_type,
            count = entries.len(),
            "Queried entries"
        );
        Ok(entries)
    }

    async fn delete_entry(&self, user_id: &str, sort_id: &str) -> Result<()> {
        keys::validate_user_id(user_id)?;
        keys::validate_entry_sk(sort_id)?;

        let op = WriteOp::Delete {
            key: (keys::entry_pk(user_id), sort_id.to_string()),
            condition: None,
        };

        self.commit(vec![op])
            .await
            .map_err(|_| RepositoryError::unavailable("DeleteItem", "commit failed"))
    }
}
