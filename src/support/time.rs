//! Timestamp helpers shared by schedule calculations

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Drop the sub-second part of `t`.
pub fn floor_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::seconds(1)).unwrap_or(t)
}

/// Whole seconds from `from` to `to`, saturated to the `i32` range used
/// by OCPP durations.
pub fn elapsed_seconds(to: DateTime<Utc>, from: DateTime<Utc>) -> i32 {
    let seconds = (to - from).num_seconds();
    seconds.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
