//! Best-effort date and time extraction
//!
//! Times are 12-hour only (`2pm`, `2:30 PM`); there is no 24-hour
//! disambiguation and no timezone. Dates are `M/D/YY` or `M/D/YYYY`, with
//! two-digit years always promoted into the 2000s.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Time returned when the fragment names no recognizable time
pub const DEFAULT_TIME: &str = "9:00 AM";

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap());

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b").unwrap());

/// Normalize the first `H[:MM] am|pm` in `fragment` to `H:MM AM|PM`
pub fn parse_time(fragment: &str) -> String {
    let Some(caps) = TIME_PATTERN.captures(fragment) else {
        return DEFAULT_TIME.to_string();
    };

    let hour: u32 = caps[1].parse().unwrap_or(9);
    let minutes = caps.get(2).map_or("00", |m| m.as_str());
    let period = caps[3].to_uppercase();

    format!("{hour}:{minutes} {period}")
}

/// Extract an `M/D/YY(YY)` date as `YYYY-MM-DD`, falling back to today
pub fn parse_date(fragment: &str) -> String {
    parse_date_with_today(fragment, Local::now().date_naive())
}

/// [`parse_date`] with an explicit fallback date
pub fn parse_date_with_today(fragment: &str, today: NaiveDate) -> String {
    match_date(fragment).unwrap_or(today).format("%Y-%m-%d").to_string()
}

fn match_date(fragment: &str) -> Option<NaiveDate> {
    let caps = DATE_PATTERN.captures(fragment)?;

    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year_text = &caps[3];
    let mut year: i32 = year_text.parse().ok()?;
    if year_text.len() == 2 {
        year += 2000;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day);
    if date.is_none() {
        tracing::debug!(month, day, year, "Invalid calendar date, using today");
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_parse_time_with_minutes() {
        assert_eq!(parse_time("2:30pm"), "2:30 PM");
        assert_eq!(parse_time("at 11:05 AM please"), "11:05 AM");
    }

    #[test]
    fn test_parse_time_hour_only() {
        assert_eq!(parse_time("2pm"), "2:00 PM");
        assert_eq!(parse_time("tomorrow at 10 am"), "10:00 AM");
    }

    #[test]
    fn test_parse_time_default() {
        assert_eq!(parse_time("no time here"), "9:00 AM");
        assert_eq!(parse_time("14:30"), "9:00 AM");
    }

    #[test]
    fn test_parse_date_two_digit_year() {
        assert_eq!(parse_date_with_today("3/8/25", today()), "2025-03-08");
    }

    #[test]
    fn test_parse_date_four_digit_year() {
        assert_eq!(parse_date_with_today("on 12/31/2026 at 2pm", today()), "2026-12-31");
    }

    #[test]
    fn test_parse_date_invalid_falls_back() {
        assert_eq!(parse_date_with_today("13/1/25", today()), "2024-06-15");
        assert_eq!(parse_date_with_today("2/30/25", today()), "2024-06-15");
    }

    #[test]
    fn test_parse_date_no_match_falls_back() {
        assert_eq!(parse_date_with_today("next tuesday", today()), "2024-06-15");
    }

    #[test]
    fn test_parse_date_uses_local_today() {
        let expected = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(parse_date("13/1/25"), expected);
    }
}
