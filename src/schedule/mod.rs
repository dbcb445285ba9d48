//! Trade-entry timestamps aligned to the chosen timeframe.

use chrono::{DateTime, Duration, TimeZone, Timelike};

use crate::models::Timeframe;

/// Next valid entry instant after `now`.
///
/// M1 is a plain one-minute offset. M5 snaps forward to the next
/// multiple-of-five minute mark and never returns the current mark, so
/// 10:05:00 yields 10:10. The computation happens in `now`'s own zone
/// because a half-hour or 45-minute offset moves the five-minute grid.
pub fn entry_time<Tz: TimeZone>(now: &DateTime<Tz>, timeframe: Timeframe) -> DateTime<Tz> {
    match timeframe {
        Timeframe::M1 => now.clone() + Duration::minutes(1),
        Timeframe::M5 => {
            let step = Timeframe::M5.minutes();
            let minute = i64::from(now.minute());
            let advance = step - minute % step;
            truncate_to_minute(now) + Duration::minutes(advance)
        }
    }
}

fn truncate_to_minute<Tz: TimeZone>(ts: &DateTime<Tz>) -> DateTime<Tz> {
    ts.clone()
        - Duration::seconds(i64::from(ts.second()))
        - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

/// Local `HH:MM` clock string.
pub fn format_clock<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.format("%H:%M").to_string()
}
