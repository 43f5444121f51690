//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and domain types.
//! These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use justlog_core::credential::{KeyDigest, StoredApiKey};
use justlog_core::entry::{Entry, Measurements};
use justlog_core::storage::{keys, RepositoryError};

pub type Item = HashMap<String, AttributeValue>;

pub const TYPE_ATTR: &str = "type";
pub const DESCRIPTION_ATTR: &str = "description";
pub const UNIT_ATTR: &str = "unit";
pub const NOTES_ATTR: &str = "notes";
pub const CREATED_AT_ATTR: &str = "createdAt";

// ============================================================================
// Key maps
// ============================================================================

/// Primary key of a record.
pub fn key(pk: impl Into<String>, sk: impl Into<String>) -> Item {
    HashMap::from([
        (keys::PARTITION_KEY.to_string(), AttributeValue::S(pk.into())),
        (keys::SORT_KEY.to_string(), AttributeValue::S(sk.into())),
    ])
}

/// Primary key of a user's API key record.
pub fn api_key_key(user_id: &str) -> Item {
    key(keys::api_key_pk(user_id), keys::api_key_sk())
}

/// Primary key of the lookup record for a digest.
pub fn lookup_key(digest: &KeyDigest) -> Item {
    key(
        keys::api_key_lookup_pk(digest),
        keys::api_key_lookup_sk(digest),
    )
}

// ============================================================================
// Credential conversions
// ============================================================================

/// API key record: `(user_id, "apikey")` carrying the digest.
pub fn api_key_to_item(user_id: &str, digest: &KeyDigest) -> Item {
    let mut item = api_key_key(user_id);
    item.insert(
        keys::KEY_HASH_ATTR.to_string(),
        AttributeValue::S(digest.as_str().to_string()),
    );
    item
}

/// Lookup record: `("apikey#<digest>", same)` carrying the owner.
pub fn lookup_to_item(digest: &KeyDigest, user_id: &str) -> Item {
    let mut item = lookup_key(digest);
    item.insert(
        keys::OWNER_ATTR.to_string(),
        AttributeValue::S(user_id.to_string()),
    );
    item
}

/// Classify a fetched API key record.
pub fn item_to_stored_api_key(item: Option<&Item>) -> StoredApiKey {
    match item {
        None => StoredApiKey::Absent,
        Some(item) => StoredApiKey::classify(
            true,
            get_optional_string(item, keys::KEY_HASH_ATTR).as_deref(),
        ),
    }
}

/// Owner of a fetched lookup record.
pub fn item_to_owner(item: &Item) -> Result<String, RepositoryError> {
    match get_optional_string(item, keys::OWNER_ATTR) {
        Some(owner) if !owner.is_empty() => Ok(owner),
        _ => Err(RepositoryError::Corrupt {
            entity: "ApiKeyLookup",
            reason: format!("missing or invalid {}", keys::OWNER_ATTR),
        }),
    }
}

// ============================================================================
// Entry conversions
// ============================================================================

/// Convert an Entry to a DynamoDB item. Unset measurements are omitted.
pub fn entry_to_item(entry: &Entry) -> Item {
    let mut item = key(keys::entry_pk(&entry.user_id), entry.sort_id());

    item.insert(
        TYPE_ATTR.to_string(),
        AttributeValue::S(entry.entry_type.as_str().to_string()),
    );
    if !entry.description.is_empty() {
        item.insert(
            DESCRIPTION_ATTR.to_string(),
            AttributeValue::S(entry.description.clone()),
        );
    }

    for (name, value) in entry.measurements.fields() {
        if let Some(value) = value {
            item.insert(name.to_string(), AttributeValue::N(format_number(value)));
        }
    }

    if let Some(unit) = &entry.unit {
        item.insert(UNIT_ATTR.to_string(), AttributeValue::S(unit.clone()));
    }
    if let Some(notes) = &entry.notes {
        item.insert(NOTES_ATTR.to_string(), AttributeValue::S(notes.clone()));
    }
    item.insert(
        CREATED_AT_ATTR.to_string(),
        AttributeValue::S(keys::format_timestamp(entry.created_at)),
    );

    item
}

/// Convert a DynamoDB item to an Entry.
///
/// Type and timestamp come from the sort key, which is what the entry is
/// addressed and ordered by.
pub fn item_to_entry(item: &Item) -> Result<Entry, RepositoryError> {
    let user_id = get_string(item, keys::PARTITION_KEY)?;
    let sk = get_string(item, keys::SORT_KEY)?;
    let (entry_type, created_at) = keys::parse_entry_sk(&sk)
        .ok_or_else(|| corrupt_entry(format!("invalid sort key {sk}")))?;

    let mut measurements = Measurements::default();
    for (name, _) in Measurements::default().fields() {
        if let Some(value) = get_optional_number(item, name)? {
            measurements.set(name, value);
        }
    }

    let mut entry = Entry::new(
        user_id,
        entry_type,
        get_optional_string(item, DESCRIPTION_ATTR).unwrap_or_default(),
        created_at,
    )
    .with_measurements(measurements);
    entry.unit = get_optional_string(item, UNIT_ATTR);
    entry.notes = get_optional_string(item, NOTES_ATTR);

    Ok(entry)
}

// ============================================================================
// Helper functions
// ============================================================================

/// DynamoDB keeps 38 significant digits. Plain notation of very large or
/// very small values runs longer than that, so those are sent in exponent form.
fn format_number(value: f64) -> String {
    let plain = value.to_string();
    if plain.len() <= 38 {
        plain
    } else {
        format!("{value:e}")
    }
}

fn corrupt_entry(reason: String) -> RepositoryError {
    RepositoryError::Corrupt {
        entity: "Entry",
        reason,
    }
}

/// Get a required string attribute.
fn get_string(item: &Item, key: &str) -> Result<String, RepositoryError> {
    get_optional_string(item, key)
        .ok_or_else(|| corrupt_entry(format!("missing or invalid field: {key}")))
}

/// Get an optional string attribute.
fn get_optional_string(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

/// Get an optional number attribute. Present but unparseable is an error.
fn get_optional_number(item: &Item, key: &str) -> Result<Option<f64>, RepositoryError> {
    match item.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_n()
            .ok()
            .and_then(|n| n.parse::<f64>().ok())
            .map(Some)
            .ok_or_else(|| corrupt_entry(format!("invalid number: {key}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use justlog_core::credential::digest_key;
    use justlog_core::entry::EntryType;

    fn sample_entry() -> Entry {
        Entry::new(
            "u1",
            EntryType::Food,
            "2 eggs",
            Utc.with_ymd_and_hms(2026, 2, 5, 8, 0, 0).unwrap(),
        )
        .with_measurements(Measurements {
            calories: Some(140.0),
            protein: Some(12.5),
            ..Default::default()
        })
        .with_notes("scrambled")
    }

    fn s(item: &Item, key: &str) -> String {
        item.get(key).unwrap().as_s().unwrap().clone()
    }

    #[test]
    fn test_entry_item_layout() {
        let item = entry_to_item(&sample_entry());

        assert_eq!(s(&item, "uid"), "u1");
        assert_eq!(s(&item, "sk"), "food#2026-02-05T08:00:00Z");
        assert_eq!(s(&item, "type"), "food");
        assert_eq!(s(&item, "description"), "2 eggs");
        assert_eq!(s(&item, "createdAt"), "2026-02-05T08:00:00Z");
        assert_eq!(item.get("calories").unwrap().as_n().unwrap(), "140");
        assert_eq!(item.get("protein").unwrap().as_n().unwrap(), "12.5");
        assert!(!item.contains_key("carbs"));
        assert!(!item.contains_key("unit"));
    }

    #[test]
    fn test_explicit_zero_is_persisted() {
        let entry = sample_entry().with_measurements(Measurements {
            fat: Some(0.0),
            ..Default::default()
        });

        let item = entry_to_item(&entry);

        assert_eq!(item.get("fat").unwrap().as_n().unwrap(), "0");
        assert_eq!(item_to_entry(&item).unwrap().measurements.fat, Some(0.0));
    }

    #[test]
    fn test_extreme_magnitudes_use_exponent_form() {
        let entry = sample_entry().with_measurements(Measurements {
            calories: Some(1e125),
            fiber: Some(2.5e-100),
            value: Some(81.4),
            ..Default::default()
        });

        let item = entry_to_item(&entry);

        assert_eq!(item.get("calories").unwrap().as_n().unwrap(), "1e125");
        assert_eq!(item.get("fiber").unwrap().as_n().unwrap(), "2.5e-100");
        assert_eq!(item.get("value").unwrap().as_n().unwrap(), "81.4");
        assert_eq!(item_to_entry(&item).unwrap(), entry);
    }

    #[test]
    fn test_entry_round_trip() {
        let entry = sample_entry();
        assert_eq!(item_to_entry(&entry_to_item(&entry)).unwrap(), entry);
    }

    #[test]
    fn test_item_to_entry_rejects_credential_records() {
        let item = api_key_to_item("u1", &digest_key("k"));
        assert!(matches!(
            item_to_entry(&item),
            Err(RepositoryError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_item_to_entry_rejects_bad_numbers() {
        let mut item = entry_to_item(&sample_entry());
        item.insert("carbs".to_string(), AttributeValue::S("lots".to_string()));

        assert!(item_to_entry(&item).is_err());
    }

    #[test]
    fn test_credential_items() {
        let digest = digest_key("k");

        let api_key = api_key_to_item("u1", &digest);
        assert_eq!(s(&api_key, "uid"), "u1");
        assert_eq!(s(&api_key, "sk"), "apikey");
        assert_eq!(s(&api_key, "KeyHash"), digest.as_str());

        let lookup = lookup_to_item(&digest, "u1");
        let lookup_pk = format!("apikey#{}", digest.as_str());
        assert_eq!(s(&lookup, "uid"), lookup_pk);
        assert_eq!(s(&lookup, "sk"), lookup_pk);
        assert_eq!(s(&lookup, "UID"), "u1");
    }

    #[test]
    fn test_stored_api_key_classification() {
        let digest = digest_key("k");

        assert_eq!(item_to_stored_api_key(None), StoredApiKey::Absent);
        assert_eq!(
            item_to_stored_api_key(Some(&api_key_to_item("u1", &digest))),
            StoredApiKey::Active(digest)
        );
        assert_eq!(
            item_to_stored_api_key(Some(&api_key_key("u1"))),
            StoredApiKey::Malformed
        );
    }

    #[test]
    fn test_item_to_owner() {
        let digest = digest_key("k");
        assert_eq!(item_to_owner(&lookup_to_item(&digest, "u1")).unwrap(), "u1");
        assert!(matches!(
            item_to_owner(&lookup_key(&digest)),
            Err(RepositoryError::Corrupt { .. })
        ));
        assert!(item_to_owner(&lookup_to_item(&digest, "")).is_err());
    }

    #[test]
    fn test_get_optional_string() {
        let mut item = HashMap::new();
        assert!(get_optional_string(&item, "missing").is_none());

        item.insert(
            "present".to_string(),
            AttributeValue::S("value".to_string()),
        );
        assert_eq!(
            get_optional_string(&item, "present"),
            Some("value".to_string())
        );
    }
}
