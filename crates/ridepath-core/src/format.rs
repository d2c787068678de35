//! ETA formatting helpers
//!
//! Durations are whole minutes. Stop ETAs from the optimizer are absolute
//! epoch seconds, so the remaining time is recomputed against "now" on every
//! render and counts down without a timer.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use std::fmt::Display;

/// Render a duration in minutes: `"45 min"`, `"2h"`, `"2h 5m"`
///
/// Negative durations render as `"0 min"`.
#[must_use]
pub fn format_eta(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        return format!("{minutes} min");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}

/// Whole minutes from `now` until `eta_secs`, floored at zero
#[must_use]
pub fn minutes_until(eta_secs: i64, now: DateTime<Utc>) -> i64 {
    let remaining = eta_secs.saturating_sub(now.timestamp());
    if remaining <= 0 {
        0
    } else {
        remaining / 60
    }
}

/// Arrival clock time after `minutes` from `now`, as `HH:MM AM/PM`
///
/// Renders `"--:--"` when the arrival falls outside the representable range.
#[must_use]
pub fn format_arrival_time<Tz>(now: DateTime<Tz>, minutes: i64) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Duration::try_minutes(minutes.max(0))
        .and_then(|offset| now.checked_add_signed(offset))
        .map_or_else(
            || "--:--".to_string(),
            |arrival| arrival.format("%I:%M %p").to_string(),
        )
}

/// Arrival clock time after `minutes` from the local wall clock
#[must_use]
pub fn calculate_eta_time(minutes: i64) -> String {
    format_arrival_time(Local::now(), minutes)
}
