//! One-second tick handle.
//!
//! The ticker spawns nothing. It only remembers when the next period is due;
//! the front end polls [`Ticker::due`] from its own event loop and runs one
//! engine tick per elapsed period. Cancelling simply forgets the schedule,
//! so it is synchronous and can never leave half a tick applied.

use std::time::{Duration, Instant};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Start the schedule at `now`. Arming an armed ticker keeps the
    /// existing schedule, so two timers can never overlap.
    pub fn arm(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.period);
        }
    }

    /// Drop the schedule. Idempotent.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Number of whole periods elapsed up to `now`, consuming them.
    ///
    /// A poll that arrives late (suspended process, slow terminal) reports
    /// every missed period at once.
    pub fn due(&mut self, now: Instant) -> u32 {
        let Some(next) = self.next_due else {
            return 0;
        };
        if now < next {
            return 0;
        }
        let behind = now.duration_since(next);
        let extra = (behind.as_nanos() / self.period.as_nanos().max(1)) as u32;
        let count = extra.saturating_add(1);
        self.next_due = Some(next + self.period * count);
        count
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}
