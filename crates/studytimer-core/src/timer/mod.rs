mod engine;
mod mode;
mod ticker;

pub use engine::{TimerEngine, TimerPhase, TimerState};
pub use mode::{
    parse_minutes, TimerMode, TimerSettings, DEFAULT_BREAK_MINUTES, DEFAULT_LONG_BREAK_MINUTES,
    DEFAULT_STUDY_MINUTES,
};
pub use ticker::{Ticker, TICK_PERIOD};
