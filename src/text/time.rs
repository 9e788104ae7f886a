//! Normalization of free-text relative timestamps ("5 hours ago") into
//! absolute time.

use chrono::{DateTime, Days, Duration, Months, Utc};
use regex::Regex;

/// Time units recognized in relative timestamps, checked in this order.
/// Matching on the singular stem also covers the plural form.
const UNITS: &[&str] = &["hour", "day", "month", "year"];

/// Convert a relative timestamp to an absolute one against `now`.
///
/// Returns `None` when the text carries no "ago" marker (such text is
/// assumed already absolute and out of scope here) or no digit. Only the
/// first matching unit keyword applies, even if the text mentions several.
pub fn normalize_relative(now: DateTime<Utc>, text: &str) -> Option<DateTime<Utc>> {
    if !text.contains("ago") {
        return None;
    }

    let digits = Regex::new(r"\d+").ok()?;
    let magnitude: u32 = digits.find(text)?.as_str().parse().ok()?;

    let unit = UNITS.iter().find(|unit| text.contains(**unit))?;

    match *unit {
        "hour" => Some(now - Duration::hours(i64::from(magnitude))),
        "day" => now.checked_sub_days(Days::new(u64::from(magnitude))),
        "month" => now.checked_sub_months(Months::new(magnitude)),
        "year" => now.checked_sub_months(Months::new(magnitude.saturating_mul(12))),
        _ => None,
    }
}
