//! Request payloads for logging entries.
//!
//! Pure data types shared by every caller that turns tool or API arguments
//! into an [`Entry`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entry, EntryError, EntryType, Measurements};

/// Arguments accepted by the `log_*` tools.
///
/// Only the measurements meaningful for the target entry type are kept; the
/// rest are dropped when the request is converted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caffeine: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl LogEntryRequest {
    /// Build the entry for `user_id`. A missing timestamp means `now`.
    pub fn into_entry(
        self,
        user_id: &str,
        entry_type: EntryType,
        now: DateTime<Utc>,
    ) -> Result<Entry, EntryError> {
        let created_at = parse_timestamp(self.timestamp.as_deref(), now)?;

        let measurements = match entry_type {
            EntryType::Food => Measurements {
                calories: self.calories,
                protein: self.protein,
                carbs: self.carbs,
                fat: self.fat,
                fiber: self.fiber,
                caffeine: self.caffeine,
                cholesterol: self.cholesterol,
                ..Default::default()
            },
            EntryType::Exercise => Measurements {
                calories: self.calories_burned.or(self.calories),
                duration: self.duration_minutes,
                ..Default::default()
            },
            EntryType::Weight => Measurements {
                value: self.weight,
                ..Default::default()
            },
        };

        let mut entry = Entry::new(
            user_id,
            entry_type,
            self.description.unwrap_or_default(),
            created_at,
        )
        .with_measurements(measurements);
        entry.unit = self.unit.filter(|u| !u.is_empty());
        entry.notes = self.notes.filter(|n| !n.is_empty());

        entry.validate()?;
        Ok(entry)
    }
}

/// Parse an RFC3339 timestamp and normalize it to UTC.
///
/// `None` or an empty string yields `now`.
pub fn parse_timestamp(
    value: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, EntryError> {
    match value.map(str::trim) {
        None | Some("") => Ok(now),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EntryError::InvalidTimestamp(format!("{raw}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn parse_timestamp_defaults_to_now() {
        assert_eq!(parse_timestamp(None, now()).unwrap(), now());
        assert_eq!(parse_timestamp(Some(""), now()).unwrap(), now());
    }

    #[test]
    fn parse_timestamp_normalizes_offsets_to_utc() {
        let parsed = parse_timestamp(Some("2026-02-05T03:00:00-05:00"), now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 2, 5, 8, 0, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp(Some("yesterday"), now()),
            Err(EntryError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn food_request_keeps_only_food_measurements() {
        let request: LogEntryRequest = serde_json::from_value(serde_json::json!({
            "description": "2 eggs",
            "calories": 140.0,
            "protein": 12.0,
            "duration_minutes": 30.0,
            "timestamp": "2026-02-05T08:00:00Z"
        }))
        .unwrap();

        let entry = request.into_entry("u1", EntryType::Food, now()).unwrap();

        assert_eq!(entry.description, "2 eggs");
        assert_eq!(entry.measurements.calories, Some(140.0));
        assert_eq!(entry.measurements.protein, Some(12.0));
        assert_eq!(entry.measurements.duration, None);
        assert_eq!(entry.sort_id(), "food#2026-02-05T08:00:00Z");
    }

    #[test]
    fn exercise_request_maps_burned_calories_and_minutes() {
        let request = LogEntryRequest {
            description: Some("30 min run".to_string()),
            calories_burned: Some(300.0),
            duration_minutes: Some(30.0),
            ..Default::default()
        };

        let entry = request.into_entry("u1", EntryType::Exercise, now()).unwrap();

        assert_eq!(entry.measurements.calories, Some(300.0));
        assert_eq!(entry.measurements.duration, Some(30.0));
        assert_eq!(entry.created_at, now());
    }

    #[test]
    fn weight_request_stores_value_and_unit() {
        let request = LogEntryRequest {
            weight: Some(81.5),
            unit: Some("kg".to_string()),
            notes: Some(String::new()),
            ..Default::default()
        };

        let entry = request.into_entry("u1", EntryType::Weight, now()).unwrap();

        assert_eq!(entry.measurements.value, Some(81.5));
        assert_eq!(entry.unit.as_deref(), Some("kg"));
        assert_eq!(entry.notes, None);
    }

    #[test]
    fn request_without_user_is_rejected() {
        let result = LogEntryRequest::default().into_entry("", EntryType::Food, now());
        assert_eq!(result, Err(EntryError::MissingUserId));
    }
}
