// src/dates.rs

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, Utc};

/// Adds calendar months. A day past the end of the resulting month clamps to
/// its last day (Jan 31 + 1 month = Feb 28/29), it never rolls forward.
/// Returns `None` only when the result leaves chrono's supported range.
pub fn add_months(date: NaiveDate, n: i32) -> Option<NaiveDate> {
    if n >= 0 {
        date.checked_add_months(Months::new(n.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(n.unsigned_abs()))
    }
}

pub fn add_years(date: NaiveDate, n: i32) -> Option<NaiveDate> {
    add_months(date, n.checked_mul(12)?)
}

pub fn add_days(date: NaiveDate, n: i64) -> Option<NaiveDate> {
    if n >= 0 {
        date.checked_add_days(Days::new(n.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(n.unsigned_abs()))
    }
}

/// "YYYY-MM-DD"
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// "2024年8月15日"
pub fn format_localized(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Parses a calendar date from user input.
///
/// Accepts a plain `YYYY-MM-DD`, an RFC 3339 timestamp, or a naive
/// `YYYY-MM-DDTHH:MM:SS`; timestamps keep only their date part.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

pub fn is_valid_date(input: &str) -> bool {
    parse_date(input).is_some()
}

/// Whole days from `now` until the start (00:00 UTC) of `deadline`,
/// rounded up: a deadline 12 hours away counts as 1 day, never 0.
pub fn days_until(deadline: NaiveDate, now: DateTime<Utc>) -> i64 {
    let deadline_start = deadline.and_time(chrono::NaiveTime::MIN).and_utc();
    let left = deadline_start - now;

    // num_days truncates toward zero, which is already the ceiling for
    // negative spans; any positive remainder, however small, rounds up.
    let days = left.num_days();
    if left > Duration::days(days) {
        days + 1
    } else {
        days
    }
}
