//! Single-table key scheme.
//!
//! Pure functions for the partition (`uid`) and sort (`sk`) values of every
//! record kind sharing the table:
//!
//! | Record            | `uid`               | `sk`                     |
//! |-------------------|---------------------|--------------------------|
//! | API key           | `<user_id>`         | `apikey`                 |
//! | API key lookup    | `apikey#<digest>`   | `apikey#<digest>`        |
//! | Log entry         | `<user_id>`         | `<type>#<RFC3339 UTC>`   |

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

use crate::credential::KeyDigest;
use crate::entry::{EntryError, EntryType};

// ============================================================================
// Attribute names
// ============================================================================

/// Partition key attribute.
pub const PARTITION_KEY: &str = "uid";
/// Sort key attribute.
pub const SORT_KEY: &str = "sk";
/// Digest attribute on the API key record.
pub const KEY_HASH_ATTR: &str = "KeyHash";
/// Owner attribute on the API key lookup record.
pub const OWNER_ATTR: &str = "UID";

// ============================================================================
// Key prefixes
// ============================================================================

pub const API_KEY_SK: &str = "apikey";
pub const API_KEY_LOOKUP_PREFIX: &str = "apikey#";
pub const ENTRY_SEPARATOR: &str = "#";

// ============================================================================
// Credential keys
// ============================================================================

/// Partition key of a user's API key record.
pub fn api_key_pk(user_id: &str) -> String {
    user_id.to_string()
}

/// Sort key of a user's API key record.
pub fn api_key_sk() -> &'static str {
    API_KEY_SK
}

/// Partition key of the lookup record for a digest.
///
/// Pattern: `apikey#<digest>`
pub fn api_key_lookup_pk(digest: &KeyDigest) -> String {
    format!("{API_KEY_LOOKUP_PREFIX}{}", digest.as_str())
}

/// Sort key of the lookup record (mirrors the partition key).
pub fn api_key_lookup_sk(digest: &KeyDigest) -> String {
    api_key_lookup_pk(digest)
}

// ============================================================================
// Entry keys
// ============================================================================

/// Partition key for a user's entries.
pub fn entry_pk(user_id: &str) -> String {
    user_id.to_string()
}

/// Sort key for an entry.
///
/// Pattern: `<type>#<YYYY-MM-DDTHH:MM:SSZ>`
///
/// The timestamp is always UTC with second precision, so sort keys of one
/// type compare lexicographically in time order.
pub fn entry_sk(entry_type: EntryType, created_at: DateTime<Utc>) -> String {
    format!(
        "{}{ENTRY_SEPARATOR}{}",
        entry_type.as_str(),
        format_timestamp(created_at)
    )
}

/// Format a timestamp the way it appears in sort keys and `createdAt`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `0000-01-01T00:00:00Z`
const EARLIEST_SORTABLE_SECS: i64 = -62_167_219_200;
/// `9999-12-31T23:59:59Z`
const LATEST_SORTABLE_SECS: i64 = 253_402_300_799;

/// Whether a timestamp formats with a four-digit year. Outside years
/// 0000-9999 chrono adds a sign, which breaks lexicographic order.
pub fn is_sortable(ts: DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

/// Pull a timestamp into the sortable range.
pub fn clamp_sortable(ts: DateTime<Utc>) -> DateTime<Utc> {
    let bound = if ts.year() < 0 {
        DateTime::from_timestamp(EARLIEST_SORTABLE_SECS, 0)
    } else if ts.year() > 9999 {
        DateTime::from_timestamp(LATEST_SORTABLE_SECS, 0)
    } else {
        None
    };
    bound.unwrap_or(ts)
}

/// Prefix shared by every sort key of one entry type.
///
/// Pattern: `<type>#`
pub fn entry_sk_prefix(entry_type: EntryType) -> String {
    format!("{}{ENTRY_SEPARATOR}", entry_type.as_str())
}

/// Split an entry sort key back into its type and timestamp.
pub fn parse_entry_sk(sk: &str) -> Option<(EntryType, DateTime<Utc>)> {
    let (kind, ts) = sk.split_once(ENTRY_SEPARATOR)?;
    let entry_type = kind.parse().ok()?;
    let created_at = DateTime::parse_from_rfc3339(ts).ok()?.with_timezone(&Utc);
    Some((entry_type, created_at))
}

/// Accept only sort keys that address an entry, so entry operations can
/// never reach the credential records sharing the partition.
pub fn validate_entry_sk(sk: &str) -> Result<(), EntryError> {
    match parse_entry_sk(sk) {
        Some(_) => Ok(()),
        None => Err(EntryError::InvalidSortId(sk.to_string())),
    }
}

// ============================================================================
// User ids
// ============================================================================

/// Reject user ids that are empty or would land in the lookup namespace.
pub fn validate_user_id(user_id: &str) -> Result<(), EntryError> {
    if user_id.trim().is_empty() {
        return Err(EntryError::MissingUserId);
    }
    if user_id.starts_with(API_KEY_LOOKUP_PREFIX) {
        return Err(EntryError::ReservedUserId);
    }
    Ok(())
}
