use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_STUDY_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;

/// Which duration setting governs the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    #[default]
    Study,
    Break,
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Study, TimerMode::Break, TimerMode::LongBreak];

    /// Label shown on the mode selector.
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Study => "STUDY",
            TimerMode::Break => "BREAK",
            TimerMode::LongBreak => "LONG BREAK",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "study" | "focus" => Ok(TimerMode::Study),
            "break" | "short_break" => Ok(TimerMode::Break),
            "long_break" | "longbreak" => Ok(TimerMode::LongBreak),
            _ => Err(format!("unknown timer mode: {s}")),
        }
    }
}

/// Minutes per mode. Every field is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub study_minutes: u32,
    pub break_minutes: u32,
    pub long_break_minutes: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            study_minutes: DEFAULT_STUDY_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
        }
    }
}

impl TimerSettings {
    /// Build settings from raw edits, substituting the default for every
    /// missing or zero field.
    pub fn from_input(study: Option<u32>, brk: Option<u32>, long_break: Option<u32>) -> Self {
        Self {
            study_minutes: or_default(study, DEFAULT_STUDY_MINUTES),
            break_minutes: or_default(brk, DEFAULT_BREAK_MINUTES),
            long_break_minutes: or_default(long_break, DEFAULT_LONG_BREAK_MINUTES),
        }
    }

    /// Same substitution applied to already-populated settings, e.g. ones
    /// deserialized from a hand-edited config file.
    pub fn normalized(self) -> Self {
        Self::from_input(
            Some(self.study_minutes),
            Some(self.break_minutes),
            Some(self.long_break_minutes),
        )
    }

    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Study => self.study_minutes,
            TimerMode::Break => self.break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        }
    }

    /// Countdown length for `mode`, saturating on absurd minute values.
    pub fn seconds_for(&self, mode: TimerMode) -> u32 {
        self.minutes_for(mode).saturating_mul(60)
    }
}

fn or_default(value: Option<u32>, default: u32) -> u32 {
    match value {
        Some(v) if v > 0 => v,
        _ => default,
    }
}

/// Parse a minutes field as typed by a user.
///
/// Empty, non-numeric and zero input all yield `None`, which
/// [`TimerSettings::from_input`] turns into the field default.
pub fn parse_minutes(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|v| *v > 0)
}
