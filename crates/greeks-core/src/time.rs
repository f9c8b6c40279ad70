use chrono::NaiveDateTime;

use crate::types::Years;

/// Calendar days in a year, leap years averaged in.
pub const DAYS_PER_YEAR: f64 = 365.25;

const SECONDS_PER_DAY: i64 = 86_400;

/// Signed year fraction from `from` to `to`.
///
/// Whole days and the remaining whole seconds are both divided by the same
/// 365.25-day year. Sub-second precision is dropped. For negative spans the
/// day count is floored, so the seconds component stays in `0..86_400`.
pub fn year_fraction(from: NaiveDateTime, to: NaiveDateTime) -> Years {
    let seconds = (to - from).num_seconds();
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let remainder = seconds.rem_euclid(SECONDS_PER_DAY);
    days as f64 / DAYS_PER_YEAR + remainder as f64 / (SECONDS_PER_DAY as f64 * DAYS_PER_YEAR)
}
