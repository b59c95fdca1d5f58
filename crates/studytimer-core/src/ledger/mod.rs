//! Study-time ledger.
//!
//! Accumulates the seconds of the current study session and a per-day log
//! of studied hours. The ledger itself is pure in-memory state; loading and
//! write-through persistence live in [`record`] and the tracker.

pub mod record;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use record::{LedgerRecord, RECORD_VERSION, STUDY_DATA_KEY, TOTAL_SECONDS_KEY};

const HOURS_PER_SECOND: f64 = 1.0 / 3600.0;

/// Marker for the end of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub date: NaiveDate,
    pub seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyLedger {
    total_session_seconds: u64,
    daily_hours: BTreeMap<NaiveDate, f64>,
}

impl StudyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(total_session_seconds: u64, daily_hours: BTreeMap<NaiveDate, f64>) -> Self {
        Self {
            total_session_seconds,
            daily_hours,
        }
    }

    /// Record one studied second against `date`.
    pub fn accumulate_second(&mut self, date: NaiveDate) {
        self.total_session_seconds = self.total_session_seconds.saturating_add(1);
        *self.daily_hours.entry(date).or_insert(0.0) += HOURS_PER_SECOND;
    }

    /// Close the current session.
    ///
    /// Day buckets were already updated second by second, so this only
    /// reports what the session amounted to. `None` for an empty session.
    pub fn flush_session(&self, date: NaiveDate) -> Option<SessionSummary> {
        (self.total_session_seconds > 0).then_some(SessionSummary {
            date,
            seconds: self.total_session_seconds,
        })
    }

    pub fn reset_session(&mut self) {
        self.total_session_seconds = 0;
    }

    pub fn total_session_seconds(&self) -> u64 {
        self.total_session_seconds
    }

    pub fn hours_on(&self, date: NaiveDate) -> f64 {
        self.daily_hours.get(&date).copied().unwrap_or(0.0)
    }

    /// Every day of the month mapped to its hours, zero-filled.
    ///
    /// `None` when `month` is not 1..=12.
    pub fn daily_hours(&self, year: i32, month: u32) -> Option<BTreeMap<u32, f64>> {
        let days = days_in_month(year, month)?;
        let mut out: BTreeMap<u32, f64> = (1..=days).map(|d| (d, 0.0)).collect();
        for (date, hours) in self.month_entries(year, month) {
            out.insert(date.day(), hours);
        }
        Some(out)
    }

    pub fn month_total(&self, year: i32, month: u32) -> f64 {
        self.month_entries(year, month).map(|(_, h)| h).sum()
    }

    /// All recorded day buckets in date order.
    pub fn days(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.daily_hours
    }

    /// Drop buckets strictly older than `cutoff`. Returns how many went.
    pub fn prune_before(&mut self, cutoff: NaiveDate) -> usize {
        let before = self.daily_hours.len();
        self.daily_hours = self.daily_hours.split_off(&cutoff);
        before - self.daily_hours.len()
    }

    fn month_entries(&self, year: i32, month: u32) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        let range = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|start| first_of_next_month(year, month).map(|end| (start, end)));
        range.into_iter().flat_map(move |(start, end)| {
            self.daily_hours
                .range(start..end)
                .map(|(date, hours)| (*date, *hours))
        })
    }
}

/// Number of days in `month` of `year`, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first_of_next_month(year, month)?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

fn first_of_next_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}
