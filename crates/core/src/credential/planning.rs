//! Pure functions for planning API key writes (Functional Core).
//!
//! Backends read the user's current API key record, classify it, and turn the
//! resulting plan into one atomic multi-item commit. A plan never contains a
//! key record write without the matching lookup record write.

use super::KeyDigest;

/// State of a user's stored API key record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredApiKey {
    /// No record.
    Absent,
    /// Record with a well-formed digest.
    Active(KeyDigest),
    /// Record exists but its digest is missing or malformed.
    Malformed,
}

impl StoredApiKey {
    /// Classify a record from its stored `KeyHash` attribute.
    ///
    /// `key_hash` is `None` when the attribute is missing or not a string.
    pub fn classify(record_exists: bool, key_hash: Option<&str>) -> Self {
        if !record_exists {
            return Self::Absent;
        }
        key_hash
            .and_then(KeyDigest::parse)
            .map_or(Self::Malformed, Self::Active)
    }
}

/// Condition the key record must satisfy for the commit to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    Absent,
    Present,
    KeyHashEquals(KeyDigest),
}

/// A single write in an API key commit.
///
/// Lookup puts are always conditioned on the lookup record being absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialWrite {
    PutApiKey {
        user_id: String,
        digest: KeyDigest,
        precondition: Precondition,
    },
    DeleteApiKey {
        user_id: String,
        precondition: Precondition,
    },
    PutLookup {
        digest: KeyDigest,
        user_id: String,
    },
    DeleteLookup {
        digest: KeyDigest,
    },
}

/// Plan replacing the user's key with `new_digest`.
///
/// The old pair (if any) is removed in the same commit that creates the new
/// pair, so at most one key is live and no lookup record is ever orphaned.
pub fn plan_issue(
    user_id: &str,
    current: &StoredApiKey,
    new_digest: KeyDigest,
) -> Vec<CredentialWrite> {
    let mut writes = Vec::with_capacity(3);

    let precondition = match current {
        StoredApiKey::Absent => Precondition::Absent,
        StoredApiKey::Active(old) => {
            writes.push(CredentialWrite::DeleteLookup {
                digest: old.clone(),
            });
            Precondition::KeyHashEquals(old.clone())
        }
        StoredApiKey::Malformed => Precondition::Present,
    };

    writes.push(CredentialWrite::PutApiKey {
        user_id: user_id.to_string(),
        digest: new_digest.clone(),
        precondition,
    });
    writes.push(CredentialWrite::PutLookup {
        digest: new_digest,
        user_id: user_id.to_string(),
    });

    writes
}

/// Plan deleting the user's key pair.
///
/// Empty when there is nothing to delete: no record, or a malformed record
/// whose lookup cannot be located.
pub fn plan_revoke(user_id: &str, current: &StoredApiKey) -> Vec<CredentialWrite> {
    match current {
        StoredApiKey::Active(digest) => vec![
            CredentialWrite::DeleteApiKey {
                user_id: user_id.to_string(),
                precondition: Precondition::KeyHashEquals(digest.clone()),
            },
            CredentialWrite::DeleteLookup {
                digest: digest.clone(),
            },
        ],
        StoredApiKey::Absent | StoredApiKey::Malformed => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::digest_key;

    fn count_puts(writes: &[CredentialWrite]) -> (usize, usize) {
        let keys = writes
            .iter()
            .filter(|w| matches!(w, CredentialWrite::PutApiKey { .. }))
            .count();
        let lookups = writes
            .iter()
            .filter(|w| matches!(w, CredentialWrite::PutLookup { .. }))
            .count();
        (keys, lookups)
    }

    #[test]
    fn classify_absent_record() {
        assert_eq!(StoredApiKey::classify(false, None), StoredApiKey::Absent);
    }

    #[test]
    fn classify_active_record() {
        let digest = digest_key("k");
        assert_eq!(
            StoredApiKey::classify(true, Some(digest.as_str())),
            StoredApiKey::Active(digest)
        );
    }

    #[test]
    fn classify_malformed_record() {
        assert_eq!(StoredApiKey::classify(true, None), StoredApiKey::Malformed);
        assert_eq!(
            StoredApiKey::classify(true, Some("not-a-digest")),
            StoredApiKey::Malformed
        );
    }

    #[test]
    fn issue_for_new_user_creates_pair_only() {
        let digest = digest_key("new");
        let writes = plan_issue("u1", &StoredApiKey::Absent, digest.clone());

        assert_eq!(
            writes,
            vec![
                CredentialWrite::PutApiKey {
                    user_id: "u1".to_string(),
                    digest: digest.clone(),
                    precondition: Precondition::Absent,
                },
                CredentialWrite::PutLookup {
                    digest,
                    user_id: "u1".to_string(),
                },
            ]
        );
    }

    #[test]
    fn issue_replaces_active_pair_in_one_commit() {
        let old = digest_key("old");
        let new = digest_key("new");
        let writes = plan_issue("u1", &StoredApiKey::Active(old.clone()), new);

        assert_eq!(count_puts(&writes), (1, 1));
        assert!(writes.contains(&CredentialWrite::DeleteLookup {
            digest: old.clone()
        }));
        assert!(writes.iter().any(|w| matches!(
            w,
            CredentialWrite::PutApiKey {
                precondition: Precondition::KeyHashEquals(d),
                ..
            } if *d == old
        )));
    }

    #[test]
    fn issue_over_malformed_record_overwrites_it() {
        let writes = plan_issue("u1", &StoredApiKey::Malformed, digest_key("new"));

        assert_eq!(count_puts(&writes), (1, 1));
        assert!(writes.iter().any(|w| matches!(
            w,
            CredentialWrite::PutApiKey {
                precondition: Precondition::Present,
                ..
            }
        )));
        assert!(!writes
            .iter()
            .any(|w| matches!(w, CredentialWrite::DeleteLookup { .. })));
    }

    #[test]
    fn revoke_active_deletes_both_records() {
        let digest = digest_key("k");
        let writes = plan_revoke("u1", &StoredApiKey::Active(digest.clone()));

        assert_eq!(
            writes,
            vec![
                CredentialWrite::DeleteApiKey {
                    user_id: "u1".to_string(),
                    precondition: Precondition::KeyHashEquals(digest.clone()),
                },
                CredentialWrite::DeleteLookup { digest },
            ]
        );
    }

    #[test]
    fn revoke_absent_or_malformed_is_a_no_op() {
        assert!(plan_revoke("u1", &StoredApiKey::Absent).is_empty());
        assert!(plan_revoke("u1", &StoredApiKey::Malformed).is_empty());
    }
}
