//! Common helpers used across the platform

use chrono::{Datelike, Duration, NaiveDate};

/// Round to a fixed number of decimal places.
///
/// Ties go to the even neighbour of the scaled value, matching the
/// rounding used when the historical averages were first produced.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Round the exact binary value of `value` to `decimals` places.
///
/// Unlike [`round_to`] nothing is scaled first, so `0.12345` (stored just
/// above the tie) becomes `0.1235` and `80.35` (stored just below) becomes
/// `80.3`. Used for values reported back in forecast responses.
pub fn round_decimal(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Display label for the seven days starting at `start`.
///
/// `December 01–07` within one month, `December 29 – January 04` across
/// a month boundary.
pub fn format_week_range(start: NaiveDate) -> String {
    let end = start + Duration::days(6);
    let start_str = start.format("%B %d");
    if start.month() == end.month() {
        format!("{}–{}", start_str, end.format("%d"))
    } else {
        format!("{} – {}", start_str, end.format("%B %d"))
    }
}
