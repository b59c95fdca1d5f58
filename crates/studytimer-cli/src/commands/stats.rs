use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use serde::Serialize;
use studytimer_core::format::{format_hours, format_study_time, month_label, parse_month};
use studytimer_core::{Clock, Config, Database, StudyLedger, StudyTracker, SystemClock};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Seconds studied in the current (uncommitted) session
    Session,
    /// Hours studied today
    Today,
    /// Per-day hours for a month, zero-filled
    Month {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month as number or name (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Every recorded day
    History,
}

#[derive(Serialize)]
struct SessionStats {
    session_seconds: u64,
    session: String,
}

#[derive(Serialize)]
struct DayStats {
    date: NaiveDate,
    label: String,
    hours: f64,
    formatted: String,
}

#[derive(Serialize)]
struct MonthStats {
    year: i32,
    month: u32,
    label: String,
    total_hours: f64,
    total: String,
    days: Vec<DayStats>,
}

fn day_stats(date: NaiveDate, hours: f64) -> DayStats {
    DayStats {
        date,
        label: format!("{} {:02}", month_label(date.month()).unwrap_or_default(), date.day()),
        hours,
        formatted: format_hours(hours),
    }
}

fn month_stats(ledger: &StudyLedger, year: i32, month: u32) -> Option<MonthStats> {
    let daily = ledger.daily_hours(year, month)?;
    let total_hours = ledger.month_total(year, month);
    let days = daily
        .into_iter()
        .filter_map(|(day, hours)| {
            NaiveDate::from_ymd_opt(year, month, day).map(|date| day_stats(date, hours))
        })
        .collect();
    Some(MonthStats {
        year,
        month,
        label: month_label(month)?.to_string(),
        total_hours,
        total: format_hours(total_hours),
        days,
    })
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let clock = SystemClock;
    let today = clock.today();
    let db = Database::open()?;
    let tracker = StudyTracker::open(db, clock, config.settings())
        .with_retention(config.ledger.retention_days);
    let ledger = tracker.ledger();

    match action {
        StatsAction::Session => {
            let secs = ledger.total_session_seconds();
            let stats = SessionStats {
                session_seconds: secs,
                session: format_study_time(secs),
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Today => {
            let stats = day_stats(today, ledger.hours_on(today));
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Month { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = match month {
                Some(m) => parse_month(&m).ok_or_else(|| format!("unknown month: {m}"))?,
                None => today.month(),
            };
            let stats = month_stats(ledger, year, month)
                .ok_or_else(|| format!("invalid month: {year}-{month}"))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::History => {
            let days: Vec<DayStats> = ledger
                .days()
                .iter()
                .map(|(date, hours)| day_stats(*date, *hours))
                .collect();
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_stats_lists_every_day() {
        let mut ledger = StudyLedger::new();
        let date = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
        for _ in 0..5400 {
            ledger.accumulate_second(date);
        }
        let stats = month_stats(&ledger, 2026, 4).unwrap();
        assert_eq!(stats.days.len(), 30);
        assert_eq!(stats.label, "April");
        assert_eq!(stats.total, "01:30");
        assert_eq!(stats.days[29].label, "April 30");
        assert_eq!(stats.days[29].formatted, "01:30");
        assert_eq!(stats.days[0].hours, 0.0);
    }

    #[test]
    fn month_stats_rejects_bad_month() {
        assert!(month_stats(&StudyLedger::new(), 2026, 13).is_none());
    }
}
