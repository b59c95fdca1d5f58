//! Timer engine implementation.
//!
//! The engine is a second-granular countdown state machine. It does not use
//! internal threads - it owns a [`Ticker`] that is armed while running, and
//! the caller polls [`TimerEngine::due_ticks`] and calls `tick()` once per
//! elapsed second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Idle | Expired)
//! Expired -> Running   (start() reloads the mode's duration first)
//! ```
//!
//! Commands that are not allowed in the current state are silent no-ops and
//! return `None`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::mode::{TimerMode, TimerSettings};
use super::ticker::Ticker;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    /// Countdown hit zero. Behaves like `Idle` for every command.
    Expired,
}

/// Plain view of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub seconds_remaining: u32,
    pub running: bool,
}

impl TimerState {
    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else if self.seconds_remaining == 0 {
            TimerPhase::Expired
        } else {
            TimerPhase::Idle
        }
    }
}

/// Core timer engine. Sole writer of the countdown state.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    settings: TimerSettings,
    state: TimerState,
    ticker: Ticker,
}

impl TimerEngine {
    /// Create an idle engine in study mode with a full countdown.
    pub fn new(settings: TimerSettings) -> Self {
        let settings = settings.normalized();
        Self {
            settings,
            state: TimerState {
                mode: TimerMode::Study,
                seconds_remaining: settings.seconds_for(TimerMode::Study),
                running: false,
            },
            ticker: Ticker::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.state.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Full length of the current mode's countdown.
    pub fn total_seconds(&self) -> u32 {
        self.settings.seconds_for(self.state.mode)
    }

    /// Seconds due since the last poll. Always 0 while not running.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        if !self.state.running {
            return 0;
        }
        self.ticker.due(now)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: TimerMode) -> Option<Event> {
        if self.state.running {
            tracing::debug!(?mode, "mode change ignored while running");
            return None;
        }
        self.state.mode = mode;
        self.reload();
        Some(Event::ModeChanged {
            mode,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(Instant::now())
    }

    /// `start()` with an explicit arming instant for the tick handle.
    pub fn start_at(&mut self, now: Instant) -> Option<Event> {
        if self.state.running {
            return None;
        }
        if self.state.seconds_remaining == 0 {
            self.reload();
        }
        self.state.running = true;
        self.ticker.arm(now);
        tracing::debug!(
            mode = ?self.state.mode,
            seconds_remaining = self.state.seconds_remaining,
            "timer started"
        );
        Some(Event::TimerStarted {
            mode: self.state.mode,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.halt();
        Some(Event::TimerPaused {
            mode: self.state.mode,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Halt and reload the mode's full duration. Valid in every phase.
    pub fn stop(&mut self) -> Option<Event> {
        self.halt();
        self.reload();
        Some(Event::TimerStopped {
            mode: self.state.mode,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `Some(Event::TimerCompleted)` on the tick that reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        if self.state.seconds_remaining > 0 {
            return None;
        }
        self.halt();
        tracing::debug!(mode = ?self.state.mode, "timer completed");
        Some(Event::TimerCompleted {
            mode: self.state.mode,
            at: Utc::now(),
        })
    }

    pub fn adjust_minutes(&mut self, delta_minutes: i64) -> Option<Event> {
        if self.state.running {
            return None;
        }
        let adjusted = i64::from(self.state.seconds_remaining)
            .saturating_add(delta_minutes.saturating_mul(60))
            .clamp(0, i64::from(u32::MAX));
        self.state.seconds_remaining = adjusted as u32;
        Some(Event::TimeAdjusted {
            delta_minutes,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Commit edited settings. Missing or zero fields take their defaults.
    ///
    /// The countdown is reloaded only when idle and only if the active
    /// mode's duration actually changed.
    pub fn update_settings(
        &mut self,
        study: Option<u32>,
        brk: Option<u32>,
        long_break: Option<u32>,
    ) -> Option<Event> {
        let next = TimerSettings::from_input(study, brk, long_break);
        let mode = self.state.mode;
        let active_changed = next.minutes_for(mode) != self.settings.minutes_for(mode);
        self.settings = next;
        if !self.state.running && active_changed {
            self.reload();
        }
        Some(Event::SettingsUpdated {
            settings: next,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn halt(&mut self) {
        self.state.running = false;
        self.ticker.cancel();
    }

    fn reload(&mut self) {
        self.state.seconds_remaining = self.settings.seconds_for(self.state.mode);
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn new_engine_is_idle_study() {
        let engine = TimerEngine::default();
        assert_eq!(engine.mode(), TimerMode::Study);
        assert_eq!(engine.seconds_remaining(), 1500);
        assert_eq!(engine.state().phase(), TimerPhase::Idle);
        assert!(!engine.ticker().is_armed());
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::default();
        assert!(engine.start().is_some());
        assert!(engine.is_running());
        assert!(engine.ticker().is_armed());
        assert!(engine.start().is_none());

        engine.tick();
        assert!(engine.pause().is_some());
        assert!(!engine.ticker().is_armed());
        assert_eq!(engine.seconds_remaining(), 1499);
        assert!(engine.pause().is_none());

        assert!(engine.start().is_some());
        assert_eq!(engine.seconds_remaining(), 1499);
    }

    #[test]
    fn set_mode_rejected_while_running() {
        let mut engine = TimerEngine::default();
        engine.start();
        let before = engine.state();
        assert!(engine.set_mode(TimerMode::Break).is_none());
        assert_eq!(engine.state(), before);
    }

    #[test]
    fn set_mode_reloads_duration() {
        let mut engine = TimerEngine::default();
        engine.adjust_minutes(3);
        engine.set_mode(TimerMode::LongBreak);
        assert_eq!(engine.seconds_remaining(), 900);
    }

    #[test]
    fn stop_reloads_duration() {
        let mut engine = TimerEngine::default();
        engine.start();
        for _ in 0..10 {
            engine.tick();
        }
        engine.stop();
        assert!(!engine.is_running());
        assert!(!engine.ticker().is_armed());
        assert_eq!(engine.seconds_remaining(), 1500);
    }

    #[test]
    fn final_tick_expires() {
        let mut engine = TimerEngine::new(TimerSettings::from_input(Some(1), None, None));
        engine.start();
        for _ in 0..59 {
            assert!(engine.tick().is_none());
        }
        match engine.tick() {
            Some(Event::TimerCompleted { mode, .. }) => assert_eq!(mode, TimerMode::Study),
            other => panic!("expected TimerCompleted, got {other:?}"),
        }
        assert_eq!(engine.state().phase(), TimerPhase::Expired);
        assert!(!engine.ticker().is_armed());
        assert!(engine.tick().is_none());
    }

    #[test]
    fn start_after_expiry_reloads() {
        let mut engine = TimerEngine::default();
        engine.adjust_minutes(-25);
        assert_eq!(engine.seconds_remaining(), 0);
        engine.start();
        assert_eq!(engine.seconds_remaining(), 1500);
    }

    #[test]
    fn adjust_clamps_at_zero() {
        let mut engine = TimerEngine::default();
        engine.adjust_minutes(-25);
        engine.adjust_minutes(10);
        assert_eq!(engine.seconds_remaining(), 600);
        engine.adjust_minutes(-100);
        assert_eq!(engine.seconds_remaining(), 0);
    }

    #[test]
    fn adjust_rejected_while_running() {
        let mut engine = TimerEngine::default();
        engine.start();
        assert!(engine.adjust_minutes(10).is_none());
        assert_eq!(engine.seconds_remaining(), 1500);
    }

    #[test]
    fn settings_reload_only_active_mode() {
        let mut engine = TimerEngine::default();
        engine.adjust_minutes(2);
        engine.update_settings(None, Some(10), None);
        assert_eq!(engine.seconds_remaining(), 1620);
        engine.update_settings(Some(30), Some(10), None);
        assert_eq!(engine.seconds_remaining(), 1800);
    }

    #[test]
    fn settings_stored_but_not_applied_while_running() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.update_settings(Some(50), None, None);
        assert_eq!(engine.seconds_remaining(), 1500);
        assert_eq!(engine.settings().study_minutes, 50);
        engine.stop();
        assert_eq!(engine.seconds_remaining(), 3000);
    }

    #[test]
    fn due_ticks_follow_ticker() {
        let t0 = Instant::now();
        let mut engine = TimerEngine::default();
        assert_eq!(engine.due_ticks(t0 + Duration::from_secs(3)), 0);
        engine.start_at(t0);
        assert_eq!(engine.due_ticks(t0 + Duration::from_millis(2100)), 2);
        engine.pause();
        assert_eq!(engine.due_ticks(t0 + Duration::from_secs(10)), 0);
    }
}
