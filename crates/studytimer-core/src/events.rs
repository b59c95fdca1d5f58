use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerMode, TimerPhase, TimerSettings};

/// Every state change in the system produces an Event.
/// Front ends render them; rejected commands produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerStopped {
        mode: TimerMode,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero on its own.
    TimerCompleted {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: TimerMode,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimeAdjusted {
        delta_minutes: i64,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        settings: TimerSettings,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// A study session ended with a non-zero total.
    SessionCommitted {
        date: NaiveDate,
        seconds: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        phase: TimerPhase,
        running: bool,
        seconds_remaining: u32,
        total_seconds: u32,
        session_seconds: u64,
        at: DateTime<Utc>,
    },
}
