//! Integration tests for the timer + ledger flow through `StudyTracker`.

use chrono::NaiveDate;
use studytimer_core::timer::parse_minutes;
use studytimer_core::{
    Event, FixedClock, MemoryStore, StudyTracker, TimerMode, TimerPhase, TimerSettings,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn tracker() -> StudyTracker<MemoryStore, FixedClock> {
    StudyTracker::open(
        MemoryStore::new(),
        FixedClock::new(today()),
        TimerSettings::default(),
    )
}

#[test]
fn test_full_default_study_session() {
    let mut t = tracker();
    t.start();
    assert_eq!(t.engine().seconds_remaining(), 1500);

    let mut completed = 0;
    for _ in 0..1500 {
        if let Some(Event::TimerCompleted { mode, .. }) = t.tick() {
            assert_eq!(mode, TimerMode::Study);
            completed += 1;
        }
    }

    assert_eq!(completed, 1);
    assert_eq!(t.engine().seconds_remaining(), 0);
    assert!(!t.engine().is_running());
    assert_eq!(t.engine().state().phase(), TimerPhase::Expired);
    assert!((t.ledger().hours_on(today()) - 1500.0 / 3600.0).abs() < 1e-9);
    assert_eq!(t.ledger().total_session_seconds(), 1500);

    // Extra ticks after expiry change nothing.
    assert!(t.tick().is_none());
    assert_eq!(t.ledger().total_session_seconds(), 1500);
}

#[test]
fn test_restart_after_expiry_reloads_duration() {
    let mut t = StudyTracker::open(
        MemoryStore::new(),
        FixedClock::new(today()),
        TimerSettings::from_input(None, Some(1), None),
    );
    t.set_mode(TimerMode::Break);
    t.start();
    for _ in 0..60 {
        t.tick();
    }
    assert_eq!(t.engine().seconds_remaining(), 0);
    t.start();
    assert_eq!(t.engine().seconds_remaining(), 60);
    assert!(t.engine().is_running());
}

#[test]
fn test_adjust_minutes_clamps() {
    let mut t = tracker();
    t.adjust_minutes(-25);
    assert_eq!(t.engine().seconds_remaining(), 0);
    t.adjust_minutes(10);
    assert_eq!(t.engine().seconds_remaining(), 600);
    t.adjust_minutes(-100);
    assert_eq!(t.engine().seconds_remaining(), 0);
}

#[test]
fn test_commands_rejected_while_running() {
    let mut t = tracker();
    t.start();
    t.tick();
    let before = t.engine().state();
    assert!(t.set_mode(TimerMode::LongBreak).is_none());
    assert!(t.adjust_minutes(5).is_none());
    assert_eq!(t.engine().state(), before);
}

#[test]
fn test_pause_keeps_remaining_and_session() {
    let mut t = tracker();
    t.start();
    for _ in 0..100 {
        t.tick();
    }
    t.pause();
    assert_eq!(t.engine().seconds_remaining(), 1400);
    assert_eq!(t.ledger().total_session_seconds(), 100);

    // Ticks while paused are ignored.
    t.tick();
    assert_eq!(t.engine().seconds_remaining(), 1400);
    assert_eq!(t.ledger().total_session_seconds(), 100);
}

#[test]
fn test_stop_keeps_daily_hours() {
    let mut t = tracker();
    t.start();
    for _ in 0..3600 {
        t.tick();
    }
    // 25-minute countdown expires first; only 1500 seconds are studied.
    assert_eq!(t.ledger().total_session_seconds(), 1500);

    t.update_settings(Some(60), None, None);
    t.start();
    for _ in 0..3600 {
        t.tick();
    }
    assert_eq!(t.ledger().total_session_seconds(), 5100);

    let before = t.ledger().days().clone();
    let events = t.stop();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SessionCommitted { seconds: 5100, .. })));
    assert_eq!(t.ledger().total_session_seconds(), 0);
    assert_eq!(t.ledger().days(), &before);
}

#[test]
fn test_update_settings_substitutes_defaults() {
    let mut t = tracker();
    t.update_settings(parse_minutes(""), parse_minutes("5"), parse_minutes("15"));
    let s = t.engine().settings();
    assert_eq!(s.study_minutes, 25);
    assert_eq!(s.break_minutes, 5);
    assert_eq!(s.long_break_minutes, 15);

    t.update_settings(Some(40), Some(0), parse_minutes("x"));
    assert_eq!(t.engine().settings(), TimerSettings::from_input(Some(40), None, None));
    assert_eq!(t.engine().seconds_remaining(), 2400);
}

#[test]
fn test_snapshot_reflects_state() {
    let mut t = tracker();
    t.set_mode(TimerMode::LongBreak);
    match t.snapshot() {
        Event::StateSnapshot {
            mode,
            phase,
            running,
            seconds_remaining,
            total_seconds,
            session_seconds,
            ..
        } => {
            assert_eq!(mode, TimerMode::LongBreak);
            assert_eq!(phase, TimerPhase::Idle);
            assert!(!running);
            assert_eq!(seconds_remaining, 900);
            assert_eq!(total_seconds, 900);
            assert_eq!(session_seconds, 0);
        }
        other => panic!("Expected StateSnapshot, got {other:?}"),
    }
}

#[test]
fn test_events_serialize_with_type_tag() {
    let mut t = tracker();
    let event = t.start().unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "TimerStarted");
    assert_eq!(json["mode"], "study");
    assert_eq!(json["seconds_remaining"], 1500);
}
