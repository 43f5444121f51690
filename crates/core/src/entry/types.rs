use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::EntryError;
use crate::storage::keys;

/// Kind of log entry. The wire form is the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Food,
    Exercise,
    Weight,
}

impl EntryType {
    pub const ALL: [EntryType; 3] = [EntryType::Food, EntryType::Exercise, EntryType::Weight];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Food => "food",
            EntryType::Exercise => "exercise",
            EntryType::Weight => "weight",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "food" => Ok(EntryType::Food),
            "exercise" => Ok(EntryType::Exercise),
            "weight" => Ok(EntryType::Weight),
            other => Err(EntryError::UnknownType(other.to_string())),
        }
    }
}

/// Sparse numeric measurements.
///
/// `None` means "not measured" and is never persisted, so it stays distinct
/// from an explicit zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
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
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Measurements {
    /// Field names as persisted, paired with their values.
    pub fn fields(&self) -> [(&'static str, Option<f64>); 9] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
            ("caffeine", self.caffeine),
            ("cholesterol", self.cholesterol),
            ("duration", self.duration),
            ("value", self.value),
        ]
    }

    /// Set a field by its persisted name. Unknown names are ignored.
    pub fn set(&mut self, field: &str, value: f64) {
        let slot = match field {
            "calories" => &mut self.calories,
            "protein" => &mut self.protein,
            "carbs" => &mut self.carbs,
            "fat" => &mut self.fat,
            "fiber" => &mut self.fiber,
            "caffeine" => &mut self.caffeine,
            "cholesterol" => &mut self.cholesterol,
            "duration" => &mut self.duration,
            "value" => &mut self.value,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Rejects values the store's number type cannot hold: NaN, infinities,
    /// and magnitudes outside `1e-130..=9.99e125` other than zero.
    pub fn validate(&self) -> Result<(), EntryError> {
        match self
            .fields()
            .into_iter()
            .find(|(_, v)| v.is_some_and(|v| !is_storable(v)))
        {
            Some((field, _)) => Err(EntryError::InvalidMeasurement { field }),
            None => Ok(()),
        }
    }
}

/// Smallest non-zero magnitude a stored number may have.
pub const MIN_MAGNITUDE: f64 = 1e-130;
/// Largest magnitude a stored number may have.
pub const MAX_MAGNITUDE: f64 = 9.999_999_999_999_999e125;

fn is_storable(value: f64) -> bool {
    value == 0.0 || (MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&value.abs())
}

/// An immutable log entry, identified by `(user_id, sort_id())`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub user_id: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub measurements: Measurements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Create an entry. The timestamp is truncated to whole seconds so it
    /// survives the RFC3339 sort id unchanged.
    pub fn new(
        user_id: impl Into<String>,
        entry_type: EntryType,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            entry_type,
            description: description.into(),
            measurements: Measurements::default(),
            unit: None,
            notes: None,
            created_at: created_at.trunc_subsecs(0),
        }
    }

    pub fn with_measurements(mut self, measurements: Measurements) -> Self {
        self.measurements = measurements;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sort id within the user's partition: `<type>#<RFC3339 UTC>`.
    pub fn sort_id(&self) -> String {
        keys::entry_sk(self.entry_type, self.created_at)
    }

    /// Check the entry can be appended.
    pub fn validate(&self) -> Result<(), EntryError> {
        keys::validate_user_id(&self.user_id)?;
        if !keys::is_sortable(self.created_at) {
            return Err(EntryError::InvalidTimestamp(format!(
                "{} is outside years 0000-9999",
                self.created_at
            )));
        }
        self.measurements.validate()
    }
}
