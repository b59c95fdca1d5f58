//! Persisted form of the ledger.
//!
//! Two keys are written through after every mutation:
//!
//! - `totalStudySeconds`: decimal string of the running session total
//! - `studyData`: `{"version": 1, "days": {"YYYY-MM-DD": hours}}`
//!
//! Older data stored `studyData` as `{"<month name>": {"DD": hours}}` with
//! no year. That shape is still read and attributed to the year passed in.
//! Anything unreadable loads as an empty ledger.

use chrono::{Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::StudyLedger;
use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const TOTAL_SECONDS_KEY: &str = "totalStudySeconds";
pub const STUDY_DATA_KEY: &str = "studyData";
pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRecord {
    pub version: u32,
    pub days: BTreeMap<NaiveDate, f64>,
}

/// Stored shape before entries are validated one by one.
#[derive(Deserialize)]
struct RawRecord {
    version: u32,
    #[serde(default)]
    days: BTreeMap<String, serde_json::Value>,
}

type LegacyRecord = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

impl LedgerRecord {
    pub fn from_ledger(ledger: &StudyLedger) -> Self {
        Self {
            version: RECORD_VERSION,
            days: ledger.days().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored `studyData` value. Malformed entries are dropped
    /// individually; returns `None` only when neither the versioned nor the
    /// legacy shape matches at all.
    pub fn parse(raw: &str, legacy_year: i32) -> Option<Self> {
        if let Ok(record) = serde_json::from_str::<RawRecord>(raw) {
            if record.version > RECORD_VERSION {
                tracing::warn!(
                    version = record.version,
                    "study data written by a newer version, reading what is recognised"
                );
            }
            return Some(Self {
                version: RECORD_VERSION,
                days: from_versioned(record.days),
            });
        }
        let legacy = serde_json::from_str::<LegacyRecord>(raw).ok()?;
        Some(Self {
            version: RECORD_VERSION,
            days: from_legacy(legacy, legacy_year),
        })
    }
}

fn valid_hours(value: &serde_json::Value) -> Option<f64> {
    value.as_f64().filter(|h| h.is_finite() && *h >= 0.0)
}

fn from_versioned(raw: BTreeMap<String, serde_json::Value>) -> BTreeMap<NaiveDate, f64> {
    let mut days = BTreeMap::new();
    for (key, value) in raw {
        match (key.parse::<NaiveDate>(), valid_hours(&value)) {
            (Ok(date), Some(hours)) => {
                days.insert(date, hours);
            }
            _ => tracing::warn!(day = %key, value = %value, "skipping malformed study data entry"),
        }
    }
    days
}

fn from_legacy(legacy: LegacyRecord, year: i32) -> BTreeMap<NaiveDate, f64> {
    let mut days = BTreeMap::new();
    for (month_name, entries) in legacy {
        let Ok(month) = month_name.parse::<Month>() else {
            tracing::warn!(month = %month_name, "skipping unknown month in legacy study data");
            continue;
        };
        for (day, value) in entries {
            let date = day
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(|d| NaiveDate::from_ymd_opt(year, month.number_from_month(), d));
            match (date, valid_hours(&value)) {
                (Some(date), Some(hours)) => {
                    *days.entry(date).or_insert(0.0) += hours;
                }
                _ => tracing::warn!(month = %month_name, day = %day, "skipping malformed legacy entry"),
            }
        }
    }
    days
}

/// Restore a ledger from `store`. Missing or malformed values count as no
/// prior data.
pub fn load<S: KeyValueStore>(store: &S, legacy_year: i32) -> StudyLedger {
    let total = match store.get(TOTAL_SECONDS_KEY) {
        Ok(Some(raw)) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "ignoring malformed {TOTAL_SECONDS_KEY}");
            0
        }),
        Ok(None) => 0,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read {TOTAL_SECONDS_KEY}");
            0
        }
    };

    let days = match store.get(STUDY_DATA_KEY) {
        Ok(Some(raw)) => match LedgerRecord::parse(&raw, legacy_year) {
            Some(record) => record.days,
            None => {
                tracing::warn!("ignoring malformed {STUDY_DATA_KEY}");
                BTreeMap::new()
            }
        },
        Ok(None) => BTreeMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read {STUDY_DATA_KEY}");
            BTreeMap::new()
        }
    };

    StudyLedger::from_parts(total, days)
}

pub fn save_total<S: KeyValueStore>(store: &mut S, ledger: &StudyLedger) -> Result<(), StorageError> {
    store.set(TOTAL_SECONDS_KEY, &ledger.total_session_seconds().to_string())
}

pub fn save_days<S: KeyValueStore>(store: &mut S, ledger: &StudyLedger) -> Result<(), StorageError> {
    let json = LedgerRecord::from_ledger(ledger)
        .to_json()
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
    store.set(STUDY_DATA_KEY, &json)
}

/// Write both keys.
pub fn save<S: KeyValueStore>(store: &mut S, ledger: &StudyLedger) -> Result<(), StorageError> {
    save_total(store, ledger)?;
    save_days(store, ledger)
}
