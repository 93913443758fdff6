//! Placing a profile's schedule periods on the timeline

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::domain::charging_profile::{ChargingProfile, ChargingProfileKind};
use crate::support::time::floor_seconds;

/// One schedule period anchored in absolute time, `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: f64,
    pub number_phases: Option<i32>,
    pub stack_level: i32,
}

/// Instants at which the profile's (first) schedule starts, as far as they
/// matter for `[window_start, window_end)`.
///
/// Recurring profiles are anchored at the latest recurrence at or before
/// `window_start`. Relative profiles start with the session and yield
/// nothing without one.
pub fn schedule_starts(
    profile: &ChargingProfile,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    session_start: Option<DateTime<Utc>>,
) -> Vec<DateTime<Utc>> {
    let Some(schedule) = profile.schedule() else {
        return Vec::new();
    };

    match profile.kind {
        ChargingProfileKind::Absolute => {
            let anchor = match schedule.start_schedule {
                Some(start) => start,
                None => {
                    warn!(profile_id = profile.id, "Absolute profile without startSchedule");
                    profile.valid_from.unwrap_or(window_start)
                }
            };
            vec![floor_seconds(anchor)]
        }
        ChargingProfileKind::Recurring => {
            let (Some(recurrency), Some(start_schedule)) =
                (profile.recurrency_kind, schedule.start_schedule)
            else {
                warn!(
                    profile_id = profile.id,
                    "Recurring profile without recurrencyKind or startSchedule"
                );
                return Vec::new();
            };

            let interval = recurrency.period();
            let window_start = floor_seconds(window_start);
            let window_end = floor_seconds(window_end);
            let since_anchor = (window_start - floor_seconds(start_schedule)).num_seconds();
            let back = since_anchor.rem_euclid(interval.num_seconds());

            let mut starts = Vec::new();
            let mut start = window_start - Duration::seconds(back);
            while start <= window_end {
                starts.push(start);
                start += interval;
            }
            starts
        }
        ChargingProfileKind::Relative => session_start.map(floor_seconds).into_iter().collect(),
    }
}

/// Materialise the periods of `profile` that fall inside the window.
///
/// Each period ends at the earliest of the next period, the schedule
/// duration, the next recurrence and `validTo`; it may not start before
/// `validFrom`. Results are clipped to the window and sorted by start.
pub fn materialize(
    profile: &ChargingProfile,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    session_start: Option<DateTime<Utc>>,
) -> Vec<PeriodEntry> {
    let Some(schedule) = profile.schedule() else {
        return Vec::new();
    };
    let window_start = floor_seconds(window_start);
    let window_end = floor_seconds(window_end);
    let valid_from = profile.valid_from.map(floor_seconds);
    let valid_to = profile.valid_to.map(floor_seconds);
    let offset = |anchor: DateTime<Utc>, seconds: i32| anchor + Duration::seconds(i64::from(seconds));

    let starts = schedule_starts(profile, window_start, window_end, session_start);
    let mut entries = Vec::new();

    for (occurrence, &anchor) in starts.iter().enumerate() {
        let next_occurrence = starts.get(occurrence + 1).copied();

        for (index, period) in schedule.periods.iter().enumerate() {
            let next_period = schedule
                .periods
                .get(index + 1)
                .map(|next| offset(anchor, next.start_period));
            let schedule_end = schedule.duration.map(|seconds| offset(anchor, seconds));

            let end = [next_period, schedule_end, next_occurrence, valid_to]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(window_end)
                .min(window_end);

            let mut start = offset(anchor, period.start_period);
            if let Some(from) = valid_from {
                start = start.max(from);
            }
            start = start.max(window_start);

            if end > start {
                entries.push(PeriodEntry {
                    start,
                    end,
                    limit: period.limit,
                    number_phases: period.number_phases,
                    stack_level: profile.stack_level,
                });
            }
        }
    }

    entries.sort_by_key(|entry| entry.start);
    entries
}
