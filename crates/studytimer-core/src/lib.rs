//! # Study Timer Core Library
//!
//! Core logic for a Pomodoro study timer: the countdown state machine and
//! the day-bucketed log of studied time. The `studytimer` CLI is a thin
//! front end over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a second-granular state machine; the caller polls its
//!   tick handle and invokes `tick()` once per elapsed second
//! - **Study Ledger**: session seconds plus studied hours per calendar day
//! - **Study Tracker**: owns both, attributes studied seconds to the clock's
//!   date and writes through to a key-value store
//! - **Storage**: SQLite key-value store and TOML configuration
//!
//! ## Key Components
//!
//! - [`StudyTracker`]: the mutation API front ends talk to
//! - [`TimerEngine`]: countdown state machine
//! - [`StudyLedger`]: studied-time aggregates
//! - [`Database`]: persistent key-value store
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod format;
pub mod ledger;
pub mod storage;
pub mod timer;
pub mod tracker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, StorageError};
pub use events::Event;
pub use ledger::{SessionSummary, StudyLedger};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{TimerEngine, TimerMode, TimerPhase, TimerSettings, TimerState};
pub use tracker::StudyTracker;
