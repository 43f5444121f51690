use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Timelike, Utc};

use super::keys;
use super::TimeWindowError;
use crate::entry::EntryType;

/// A closed UTC time window `[from, to]` with whole-second bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window, validating that from <= to.
    ///
    /// Sort keys only carry whole seconds, so `from` is rounded up and `to`
    /// rounded down. Every entry matched by the key range then also satisfies
    /// `from <= created_at <= to`.
    ///
    /// Both bounds are clamped to years 0000-9999, the range entries can be
    /// stored in.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, TimeWindowError> {
        let from = if from.nanosecond() > 0 {
            from.trunc_subsecs(0) + chrono::Duration::seconds(1)
        } else {
            from
        };
        let to = to.trunc_subsecs(0);
        if from > to {
            return Err(TimeWindowError::InvalidRange);
        }
        Ok(Self {
            from: keys::clamp_sortable(from),
            to: keys::clamp_sortable(to),
        })
    }

    /// Window covering whole calendar days (UTC), as callers ask for them.
    ///
    /// Both days default to `today`. `from` starts at midnight; `to` is
    /// extended to midnight of the following day, so a single date covers
    /// that full day.
    pub fn for_days(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, TimeWindowError> {
        let from = from.unwrap_or(today);
        let to = to
            .unwrap_or(today)
            .succ_opt()
            .ok_or(TimeWindowError::InvalidRange)?;

        Self::new(midnight(from), midnight(to))
    }

    /// Window covering today only.
    pub fn today(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self::for_days(Some(today), Some(today), today)
            .unwrap_or(Self { from: now, to: now })
    }

    /// Whether a timestamp falls inside the window (inclusive).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from <= ts && ts <= self.to
    }

    /// Inclusive sort key bounds for one entry type.
    pub fn sort_bounds(&self, entry_type: EntryType) -> (String, String) {
        (
            keys::entry_sk(entry_type, self.from),
            keys::entry_sk(entry_type, self.to),
        )
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
