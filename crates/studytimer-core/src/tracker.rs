//! Study tracker: the single owner of timer and ledger state.
//!
//! Front ends hold one `StudyTracker` and drive everything through it:
//! user commands are forwarded to the engine, elapsed seconds come in via
//! [`StudyTracker::poll`] (or [`StudyTracker::tick`] directly), and every
//! studied second is written through to the key-value store.
//!
//! ```ignore
//! let mut tracker = StudyTracker::open(Database::open()?, SystemClock, config.settings());
//! tracker.start();
//! // In the event loop:
//! for event in tracker.poll(Instant::now()) { render(&event); }
//! ```

use chrono::{Datelike, Days, Utc};
use std::time::Instant;

use crate::clock::Clock;
use crate::events::Event;
use crate::ledger::{record, StudyLedger};
use crate::storage::KeyValueStore;
use crate::timer::{TimerEngine, TimerMode, TimerSettings};

pub struct StudyTracker<S, C> {
    engine: TimerEngine,
    ledger: StudyLedger,
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> StudyTracker<S, C> {
    /// Restore the ledger from `store` and create an idle study timer.
    pub fn open(store: S, clock: C, settings: TimerSettings) -> Self {
        let ledger = record::load(&store, clock.today().year());
        tracing::debug!(
            session_seconds = ledger.total_session_seconds(),
            days = ledger.days().len(),
            "ledger restored"
        );
        Self {
            engine: TimerEngine::new(settings),
            ledger,
            store,
            clock,
        }
    }

    /// Keep only the most recent `days` day buckets (today included).
    /// `None` or `Some(0)` keeps everything.
    pub fn with_retention(mut self, days: Option<u32>) -> Self {
        let Some(days) = days.filter(|d| *d > 0) else {
            return self;
        };
        let today = self.clock.today();
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(days - 1))) else {
            return self;
        };
        let pruned = self.ledger.prune_before(cutoff);
        if pruned > 0 {
            tracing::info!(pruned, %cutoff, "dropped study days outside retention window");
            self.persist_days();
        }
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &StudyLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_studying(&self) -> bool {
        self.engine.is_running() && self.engine.mode() == TimerMode::Study
    }

    pub fn snapshot(&self) -> Event {
        let state = self.engine.state();
        Event::StateSnapshot {
            mode: state.mode,
            phase: state.phase(),
            running: state.running,
            seconds_remaining: state.seconds_remaining,
            total_seconds: self.engine.total_seconds(),
            session_seconds: self.ledger.total_session_seconds(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: TimerMode) -> Option<Event> {
        self.engine.set_mode(mode)
    }

    pub fn start(&mut self) -> Option<Event> {
        self.engine.start()
    }

    pub fn start_at(&mut self, now: Instant) -> Option<Event> {
        self.engine.start_at(now)
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.engine.pause()
    }

    pub fn adjust_minutes(&mut self, delta_minutes: i64) -> Option<Event> {
        self.engine.adjust_minutes(delta_minutes)
    }

    pub fn update_settings(
        &mut self,
        study: Option<u32>,
        brk: Option<u32>,
        long_break: Option<u32>,
    ) -> Option<Event> {
        self.engine.update_settings(study, brk, long_break)
    }

    /// Stop the countdown and end the study session.
    ///
    /// A non-empty study session is reported as `SessionCommitted`; the
    /// session total is reset either way.
    pub fn stop(&mut self) -> Vec<Event> {
        let was_study = self.engine.mode() == TimerMode::Study;
        let mut events: Vec<Event> = self.engine.stop().into_iter().collect();

        if was_study {
            if let Some(summary) = self.ledger.flush_session(self.clock.today()) {
                tracing::info!(
                    seconds = summary.seconds,
                    date = %summary.date,
                    "study session committed"
                );
                events.push(Event::SessionCommitted {
                    date: summary.date,
                    seconds: summary.seconds,
                    at: Utc::now(),
                });
            }
        }

        if self.ledger.total_session_seconds() > 0 {
            self.ledger.reset_session();
            self.persist_total();
        }
        events
    }

    /// One elapsed second. Studied seconds go to today's bucket.
    pub fn tick(&mut self) -> Option<Event> {
        let studying = self.is_studying();
        let event = self.engine.tick();
        if studying {
            self.ledger.accumulate_second(self.clock.today());
            self.persist_total();
            self.persist_days();
        }
        event
    }

    /// Run every tick that came due up to `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<Event> {
        let due = self.engine.due_ticks(now);
        let mut events = Vec::new();
        for _ in 0..due {
            if !self.engine.is_running() {
                break;
            }
            events.extend(self.tick());
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist_total(&mut self) {
        if let Err(e) = record::save_total(&mut self.store, &self.ledger) {
            tracing::warn!(error = %e, "failed to persist session total");
        }
    }

    fn persist_days(&mut self) {
        if let Err(e) = record::save_days(&mut self.store, &self.ledger) {
            tracing::warn!(error = %e, "failed to persist study days");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::StorageError;
    use crate::ledger::{STUDY_DATA_KEY, TOTAL_SECONDS_KEY};
    use crate::storage::MemoryStore;
    use crate::timer::TimerPhase;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    /// Store whose writes always fail.
    struct LockedStore;

    impl KeyValueStore for LockedStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    fn tracker() -> StudyTracker<MemoryStore, FixedClock> {
        StudyTracker::open(
            MemoryStore::new(),
            FixedClock::new(today()),
            TimerSettings::default(),
        )
    }

    #[test]
    fn ticks_while_studying_reach_the_ledger_and_store() {
        let mut t = tracker();
        t.start();
        for _ in 0..5 {
            t.tick();
        }
        assert_eq!(t.ledger().total_session_seconds(), 5);
        assert_eq!(t.store().get(TOTAL_SECONDS_KEY).unwrap().as_deref(), Some("5"));
        assert!(t.store().get(STUDY_DATA_KEY).unwrap().is_some());
    }

    #[test]
    fn break_ticks_are_not_studied() {
        let mut t = tracker();
        t.set_mode(TimerMode::Break);
        t.start();
        for _ in 0..5 {
            t.tick();
        }
        assert_eq!(t.ledger().total_session_seconds(), 0);
        assert_eq!(t.ledger().hours_on(today()), 0.0);
        assert_eq!(t.engine().seconds_remaining(), 295);
    }

    #[test]
    fn stop_commits_and_resets_session() {
        let mut t = tracker();
        t.start();
        for _ in 0..30 {
            t.tick();
        }
        let hours = t.ledger().hours_on(today());
        let events = t.stop();
        assert!(matches!(events[0], Event::TimerStopped { .. }));
        assert!(matches!(
            events[1],
            Event::SessionCommitted { seconds: 30, .. }
        ));
        assert_eq!(t.ledger().total_session_seconds(), 0);
        assert_eq!(t.ledger().hours_on(today()), hours);
        assert_eq!(t.store().get(TOTAL_SECONDS_KEY).unwrap().as_deref(), Some("0"));
        assert_eq!(t.engine().seconds_remaining(), 1500);
    }

    #[test]
    fn stop_without_study_commits_nothing() {
        let mut t = tracker();
        let events = t.stop();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn stop_in_break_still_resets_session_total() {
        let mut t = tracker();
        t.start();
        t.tick();
        t.pause();
        t.set_mode(TimerMode::Break);
        let events = t.stop();
        assert_eq!(events.len(), 1);
        assert_eq!(t.ledger().total_session_seconds(), 0);
    }

    #[test]
    fn poll_runs_due_ticks_and_stops_at_expiry() {
        let mut t = StudyTracker::open(
            MemoryStore::new(),
            FixedClock::new(today()),
            TimerSettings::from_input(Some(1), None, None),
        );
        let t0 = Instant::now();
        t.start_at(t0);
        assert!(t.poll(t0 + Duration::from_millis(500)).is_empty());
        assert!(t.poll(t0 + Duration::from_secs(30)).is_empty());
        assert_eq!(t.engine().seconds_remaining(), 30);

        let events = t.poll(t0 + Duration::from_secs(90));
        assert!(matches!(events.as_slice(), [Event::TimerCompleted { .. }]));
        assert_eq!(t.engine().state().phase(), TimerPhase::Expired);
        assert_eq!(t.ledger().total_session_seconds(), 60);
    }

    #[test]
    fn session_survives_reopen() {
        let mut t = tracker();
        t.start();
        for _ in 0..12 {
            t.tick();
        }
        let store = t.store().clone();
        let reopened = StudyTracker::open(store, FixedClock::new(today()), TimerSettings::default());
        assert_eq!(reopened.ledger().total_session_seconds(), 12);
        assert!((reopened.ledger().hours_on(today()) - 12.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn retention_prunes_old_days() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        let mut t = StudyTracker::open(MemoryStore::new(), &clock, TimerSettings::default());
        t.start();
        t.tick();
        clock.set(today());
        t.tick();
        let store = t.store().clone();

        let kept = StudyTracker::open(store.clone(), &clock, TimerSettings::default())
            .with_retention(Some(30));
        assert_eq!(kept.ledger().days().len(), 1);

        let all = StudyTracker::open(store, &clock, TimerSettings::default()).with_retention(None);
        assert_eq!(all.ledger().days().len(), 2);
    }

    #[test]
    fn day_rollover_splits_buckets() {
        let clock = FixedClock::new(today());
        let mut t = StudyTracker::open(MemoryStore::new(), &clock, TimerSettings::default());
        t.start();
        t.tick();
        clock.set(today().succ_opt().unwrap());
        t.tick();
        assert_eq!(t.ledger().days().len(), 2);
        assert_eq!(t.ledger().total_session_seconds(), 2);
    }

    #[test]
    fn failing_writes_do_not_interrupt_the_timeline() {
        let mut t = StudyTracker::open(
            LockedStore,
            FixedClock::new(today()),
            TimerSettings::from_input(Some(1), None, None),
        );
        assert!(t.start().is_some());
        for _ in 0..10 {
            t.tick();
        }
        assert_eq!(t.engine().seconds_remaining(), 50);
        assert_eq!(t.ledger().total_session_seconds(), 10);
        assert!((t.ledger().hours_on(today()) - 10.0 / 3600.0).abs() < 1e-12);

        let events = t.stop();
        assert!(matches!(
            events.as_slice(),
            [Event::TimerStopped { .. }, Event::SessionCommitted { seconds: 10, .. }]
        ));
        assert_eq!(t.ledger().total_session_seconds(), 0);
        assert!((t.ledger().hours_on(today()) - 10.0 / 3600.0).abs() < 1e-12);
        assert_eq!(t.engine().seconds_remaining(), 60);

        t.start();
        for _ in 0..60 {
            t.tick();
        }
        assert_eq!(t.engine().state().phase(), TimerPhase::Expired);
        assert_eq!(t.ledger().total_session_seconds(), 60);
    }
}
