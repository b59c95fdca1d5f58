//! Display helpers shared by front ends.

use chrono::Month;

/// Countdown as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Study time as `HH:MM`, floored to the minute.
pub fn format_study_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

/// Fractional hours as `HH:MM`, rounded to the nearest minute.
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).round() as u64;
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// `10` -> `"October"`.
pub fn month_label(month: u32) -> Option<&'static str> {
    let month = u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok())?;
    Some(month.name())
}

/// Accepts `10`, `oct`, `October`.
pub fn parse_month(input: &str) -> Option<u32> {
    let input = input.trim();
    if let Ok(n) = input.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    input.parse::<Month>().ok().map(|m| m.number_from_month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown() {
        assert_eq!(format_countdown(1500), "25:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(125 * 60 + 1), "125:01");
    }

    #[test]
    fn study_time_floors() {
        assert_eq!(format_study_time(0), "00:00");
        assert_eq!(format_study_time(3599), "00:59");
        assert_eq!(format_study_time(3600 * 3 + 60 * 7 + 59), "03:07");
    }

    #[test]
    fn hours_round_to_minute() {
        assert_eq!(format_hours(1500.0 / 3600.0), "00:25");
        assert_eq!(format_hours(1.0), "01:00");
        assert_eq!(format_hours(0.9999), "01:00");
        assert_eq!(format_hours(-1.0), "00:00");
    }

    #[test]
    fn months() {
        assert_eq!(month_label(10), Some("October"));
        assert_eq!(month_label(13), None);
        assert_eq!(parse_month("10"), Some(10));
        assert_eq!(parse_month("april"), Some(4));
        assert_eq!(parse_month("Dec"), Some(12));
        assert_eq!(parse_month("0"), None);
        assert_eq!(parse_month("smarch"), None);
    }
}
