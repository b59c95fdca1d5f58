//! Foreground timer session.
//!
//! Commands arrive on stdin one per line; state changes are printed to
//! stdout as JSON lines (or short text with `--plain`). Everything runs on a
//! single-threaded runtime, so the tracker needs no locking.

use clap::Args;
use std::time::{Duration, Instant};
use studytimer_core::format::{format_countdown, format_study_time};
use studytimer_core::timer::parse_minutes;
use studytimer_core::{
    Config, Database, Event, KeyValueStore, StudyTracker, SystemClock, TimerMode, TimerPhase,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct RunArgs {
    /// Mode to begin in (study, break, long_break)
    #[arg(long, default_value = "study")]
    mode: TimerMode,
    /// Start the countdown immediately
    #[arg(long)]
    start: bool,
    /// Print short text lines instead of JSON
    #[arg(long)]
    plain: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Pause,
    Stop,
    Mode(TimerMode),
    Adjust(i64),
    Settings(Option<u32>, Option<u32>, Option<u32>),
    Status,
    Quit,
}

pub fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let mut words = line.split_whitespace();
    let head = words.next().ok_or("empty command")?.to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();

    let minutes_arg = |default: i64| -> Result<i64, String> {
        match rest.first() {
            None => Ok(default),
            Some(n) => n.parse::<i64>().map_err(|_| format!("not a number: {n}")),
        }
    };

    match head.as_str() {
        "start" | "s" => Ok(SessionCommand::Start),
        "pause" | "p" => Ok(SessionCommand::Pause),
        "stop" | "x" => Ok(SessionCommand::Stop),
        "status" | "?" => Ok(SessionCommand::Status),
        "quit" | "q" | "exit" => Ok(SessionCommand::Quit),
        "mode" | "m" => {
            let mode = rest.join(" ");
            mode.parse::<TimerMode>().map(SessionCommand::Mode)
        }
        "add" => minutes_arg(1).map(SessionCommand::Adjust),
        "sub" => minutes_arg(1).map(|n| SessionCommand::Adjust(-n)),
        "+" => Ok(SessionCommand::Adjust(1)),
        "-" => Ok(SessionCommand::Adjust(-1)),
        "settings" => {
            let field = |i: usize| rest.get(i).and_then(|v| parse_minutes(v));
            Ok(SessionCommand::Settings(field(0), field(1), field(2)))
        }
        other => other
            .parse::<i64>()
            .ok()
            .filter(|_| other.starts_with('+') || other.starts_with('-'))
            .map(SessionCommand::Adjust)
            .ok_or_else(|| format!("unknown command: {other}")),
    }
}

/// Apply one command. Returns the resulting events and whether to exit.
pub fn apply<S: KeyValueStore>(
    tracker: &mut StudyTracker<S, SystemClock>,
    command: SessionCommand,
) -> (Vec<Event>, bool) {
    let events = match command {
        SessionCommand::Start => tracker.start().into_iter().collect(),
        SessionCommand::Pause => tracker.pause().into_iter().collect(),
        SessionCommand::Stop => tracker.stop(),
        SessionCommand::Mode(mode) => tracker.set_mode(mode).into_iter().collect(),
        SessionCommand::Adjust(delta) => tracker.adjust_minutes(delta).into_iter().collect(),
        SessionCommand::Settings(study, brk, long_break) => tracker
            .update_settings(study, brk, long_break)
            .into_iter()
            .collect(),
        SessionCommand::Status => vec![tracker.snapshot()],
        SessionCommand::Quit => return (finish(tracker), true),
    };
    (events, false)
}

/// End of session: a running countdown is stopped so its study time is
/// committed.
fn finish<S: KeyValueStore>(tracker: &mut StudyTracker<S, SystemClock>) -> Vec<Event> {
    if tracker.engine().is_running() {
        tracker.stop()
    } else {
        Vec::new()
    }
}

fn render(event: &Event, plain: bool) -> Result<String, serde_json::Error> {
    if !plain {
        return serde_json::to_string(event);
    }
    Ok(match event {
        Event::StateSnapshot {
            mode,
            phase,
            seconds_remaining,
            session_seconds,
            ..
        } => {
            let phase = match phase {
                TimerPhase::Idle => "paused",
                TimerPhase::Running => "running",
                TimerPhase::Expired => "done",
            };
            format!(
                "{mode:<10} {}  {phase:<7}  total study {}",
                format_countdown(*seconds_remaining),
                format_study_time(*session_seconds)
            )
        }
        Event::TimerStarted { mode, .. } => format!("{mode} started"),
        Event::TimerPaused { .. } => "paused".to_string(),
        Event::TimerStopped { mode, seconds_remaining, .. } => {
            format!("{mode} stopped, reset to {}", format_countdown(*seconds_remaining))
        }
        Event::TimerCompleted { mode, .. } => format!("{mode} finished"),
        Event::ModeChanged { mode, seconds_remaining, .. } => {
            format!("mode {mode} ({})", format_countdown(*seconds_remaining))
        }
        Event::TimeAdjusted { seconds_remaining, .. } => {
            format!("time set to {}", format_countdown(*seconds_remaining))
        }
        Event::SettingsUpdated { settings, .. } => format!(
            "settings: study {}m, break {}m, long break {}m",
            settings.study_minutes, settings.break_minutes, settings.long_break_minutes
        ),
        Event::SessionCommitted { seconds, date, .. } => {
            format!("recorded {} of study on {date}", format_study_time(*seconds))
        }
    })
}

fn emit(events: &[Event], plain: bool) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", render(event, plain)?);
    }
    Ok(())
}

async fn read_commands(tx: mpsc::UnboundedSender<String>) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                break;
            }
        }
        let Some(line) = decode_line(&buf) else {
            tracing::warn!("ignoring input line that is not valid UTF-8");
            continue;
        };
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// One raw stdin line without its terminator, or `None` if it is not UTF-8.
fn decode_line(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    Some(text.trim_end_matches(['\r', '\n']).to_string())
}

pub fn run(args: RunArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(args, config));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}

async fn session(args: RunArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut tracker = StudyTracker::open(db, SystemClock, config.settings())
        .with_retention(config.ledger.retention_days);
    let plain = args.plain;

    if args.mode != TimerMode::Study {
        emit(&tracker.set_mode(args.mode).into_iter().collect::<Vec<_>>(), plain)?;
    }
    if args.start {
        emit(&tracker.start().into_iter().collect::<Vec<_>>(), plain)?;
    }
    emit(&[tracker.snapshot()], plain)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(tx));

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let before = tracker.engine().seconds_remaining();
                let events = tracker.poll(Instant::now());
                emit(&events, plain)?;
                if tracker.engine().seconds_remaining() != before {
                    emit(&[tracker.snapshot()], plain)?;
                }
            }
            line = rx.recv() => {
                let Some(line) = line else {
                    tracing::debug!("stdin closed");
                    emit(&finish(&mut tracker), plain)?;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => {
                        let (events, quit) = apply(&mut tracker, command);
                        emit(&events, plain)?;
                        if quit {
                            break;
                        }
                    }
                    Err(message) => eprintln!("{message}"),
                }
            }
            _ = &mut ctrl_c => {
                tracing::debug!("interrupted");
                emit(&finish(&mut tracker), plain)?;
                break;
            }
        }
    }
    Ok(())
}
