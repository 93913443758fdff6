//! Composite schedule calculation
//!
//! Materialises every applicable profile over the requested window, then
//! sweeps the period boundaries in time order. At each instant:
//!
//! * within one purpose the highest stack level wins outright;
//! * `TxProfile` replaces `TxDefaultProfile`, which replaces the default limit;
//! * `ChargingStationMaxProfile` and `ChargingStationExternalConstraints`
//!   cap the result, the lowest limit applies.
//!
//! The station-wide schedule adds up what every EVSE may draw before the
//! `ChargingStationMaxProfile` caps the total.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::schedule::{materialize, PeriodEntry};
use crate::domain::charging_profile::{
    ChargingProfile, ChargingProfilePurpose, ChargingRateUnit, ChargingSchedulePeriod,
    CompositeSchedule, CompositeScheduleDefaultLimits, STATION_WIDE_ID,
};
use crate::domain::ports::TransactionContext;
use crate::support::time::{elapsed_seconds, floor_seconds};

/// A materialised period tagged with its profile's purpose and the position
/// of that profile in the input.
struct Candidate {
    purpose: ChargingProfilePurpose,
    order: usize,
    entry: PeriodEntry,
}

/// Highest stack level of `purpose` active at `at`; earlier input wins ties.
fn winner(
    candidates: &[Candidate],
    purpose: ChargingProfilePurpose,
    at: DateTime<Utc>,
) -> Option<&PeriodEntry> {
    candidates
        .iter()
        .filter(|c| c.purpose == purpose && c.entry.start <= at && at < c.entry.end)
        .min_by_key(|c| (Reverse(c.entry.stack_level), c.order))
        .map(|c| &c.entry)
}

pub struct CompositeScheduleCalculator {
    transactions: Arc<dyn TransactionContext>,
    defaults: CompositeScheduleDefaultLimits,
}

impl CompositeScheduleCalculator {
    pub fn new(
        transactions: Arc<dyn TransactionContext>,
        defaults: CompositeScheduleDefaultLimits,
    ) -> Self {
        Self {
            transactions,
            defaults,
        }
    }

    pub fn defaults(&self) -> CompositeScheduleDefaultLimits {
        self.defaults
    }

    /// Resolve `profiles` into one gapless limit timeline over `[start, end)`.
    ///
    /// Profiles in another unit are ignored. When profiles of one purpose
    /// tie on stack level, the one earlier in `profiles` wins.
    pub fn calculate_composite_schedule(
        &self,
        profiles: &[ChargingProfile],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        evse_id: i32,
        unit: ChargingRateUnit,
    ) -> CompositeSchedule {
        let (start, end) = (floor_seconds(start), floor_seconds(end));
        let mut composite = self.empty_composite(evse_id, start, end, unit);
        if end <= start {
            warn!(evse_id, %start, %end, "Composite schedule requested for an empty window");
            return composite;
        }

        let candidates = self.candidates(profiles, start, end, self.session_start(evse_id), unit);
        composite.periods = self.sweep(start, end, [candidates.as_slice()], |at| {
            let own = self.evse_limit(&candidates, at, unit);
            let station_max =
                winner(&candidates, ChargingProfilePurpose::ChargingStationMaxProfile, at);
            self.capped(own, station_max)
        });

        debug!(
            evse_id,
            unit = %unit,
            candidates = candidates.len(),
            periods = composite.periods.len(),
            "Composite schedule calculated"
        );
        composite
    }

    /// Station-wide timeline: at every instant the limits of all EVSEs are
    /// added up, then the station's `ChargingStationMaxProfile` caps the sum.
    ///
    /// `evse_profiles` holds the valid profiles of each EVSE, station-wide
    /// ones included. The phase count of the sum is the highest of the EVSEs.
    /// Without EVSEs the station profiles are resolved on their own.
    pub fn calculate_station_composite_schedule(
        &self,
        station_profiles: &[ChargingProfile],
        evse_profiles: &[(i32, Vec<ChargingProfile>)],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        unit: ChargingRateUnit,
    ) -> CompositeSchedule {
        if evse_profiles.is_empty() {
            return self.calculate_composite_schedule(
                station_profiles,
                start,
                end,
                STATION_WIDE_ID,
                unit,
            );
        }

        let (start, end) = (floor_seconds(start), floor_seconds(end));
        let mut composite = self.empty_composite(STATION_WIDE_ID, start, end, unit);
        if end <= start {
            warn!(%start, %end, "Station composite schedule requested for an empty window");
            return composite;
        }

        let station = self.candidates(station_profiles, start, end, None, unit);
        let per_evse: Vec<Vec<Candidate>> = evse_profiles
            .iter()
            .map(|(evse_id, profiles)| {
                self.candidates(profiles, start, end, self.session_start(*evse_id), unit)
            })
            .collect();

        let sources =
            std::iter::once(station.as_slice()).chain(per_evse.iter().map(Vec::as_slice));
        composite.periods = self.sweep(start, end, sources, |at| {
            let (sum, phases) = per_evse.iter().fold((0.0, None), |(sum, phases), candidates| {
                let (limit, evse_phases) = self.evse_limit(candidates, at, unit);
                let evse_phases = evse_phases.unwrap_or(self.defaults.number_phases);
                (sum + limit, phases.max(Some(evse_phases)))
            });
            self.capped(
                (sum, phases),
                winner(&station, ChargingProfilePurpose::ChargingStationMaxProfile, at),
            )
        });

        debug!(
            evses = evse_profiles.len(),
            unit = %unit,
            periods = composite.periods.len(),
            "Station composite schedule calculated"
        );
        composite
    }

    fn empty_composite(
        &self,
        evse_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        unit: ChargingRateUnit,
    ) -> CompositeSchedule {
        CompositeSchedule {
            evse_id,
            duration: if end > start { elapsed_seconds(end, start) } else { 0 },
            schedule_start: start,
            charging_rate_unit: unit,
            periods: Vec::new(),
        }
    }

    fn session_start(&self, evse_id: i32) -> Option<DateTime<Utc>> {
        if evse_id == STATION_WIDE_ID {
            return None;
        }
        self.transactions
            .active_transaction(evse_id)
            .map(|tx| tx.start_time)
    }

    fn candidates(
        &self,
        profiles: &[ChargingProfile],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        session_start: Option<DateTime<Utc>>,
        unit: ChargingRateUnit,
    ) -> Vec<Candidate> {
        profiles
            .iter()
            .enumerate()
            .filter(|(_, profile)| {
                profile.is_valid_within(start, end) && profile.charging_rate_unit() == Some(unit)
            })
            .flat_map(|(order, profile)| {
                materialize(profile, start, end, session_start)
                    .into_iter()
                    .map(move |entry| Candidate {
                        purpose: profile.purpose,
                        order,
                        entry,
                    })
            })
            .collect()
    }

    /// Emit a period at every boundary of `sources`, coalescing neighbours
    /// with the same limit and phase count.
    fn sweep<'a>(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sources: impl IntoIterator<Item = &'a [Candidate]>,
        limit_at: impl Fn(DateTime<Utc>) -> (f64, i32),
    ) -> Vec<ChargingSchedulePeriod> {
        let mut boundaries = BTreeSet::from([start, end]);
        for candidate in sources.into_iter().flatten() {
            boundaries.insert(candidate.entry.start);
            boundaries.insert(candidate.entry.end);
        }
        let boundaries: Vec<_> = boundaries.into_iter().collect();

        let mut periods: Vec<ChargingSchedulePeriod> = Vec::new();
        for window in boundaries.windows(2) {
            let at = window[0];
            let (limit, number_phases) = limit_at(at);

            let unchanged = periods.last().map_or(false, |last| {
                last.limit == limit && last.number_phases == Some(number_phases)
            });
            if !unchanged {
                periods.push(
                    ChargingSchedulePeriod::new(elapsed_seconds(at, start), limit)
                        .with_number_phases(number_phases),
                );
            }
        }
        periods
    }

    /// What one EVSE may draw at `at` before the station maximum applies:
    /// the Tx or TxDefault limit (or the default), capped by external
    /// constraints.
    fn evse_limit(
        &self,
        candidates: &[Candidate],
        at: DateTime<Utc>,
        unit: ChargingRateUnit,
    ) -> (f64, Option<i32>) {
        let tx = winner(candidates, ChargingProfilePurpose::TxProfile, at)
            .or_else(|| winner(candidates, ChargingProfilePurpose::TxDefaultProfile, at));
        let external = winner(
            candidates,
            ChargingProfilePurpose::ChargingStationExternalConstraints,
            at,
        );

        let base = tx.map_or(self.defaults.limit_for(unit), |entry| entry.limit);
        let limit = external.map_or(base, |cap| base.min(cap.limit));
        let number_phases = tx
            .into_iter()
            .chain(external)
            .filter_map(|entry| entry.number_phases)
            .min();

        (limit, number_phases)
    }

    fn capped(
        &self,
        (limit, number_phases): (f64, Option<i32>),
        cap: Option<&PeriodEntry>,
    ) -> (f64, i32) {
        let limit = cap.map_or(limit, |cap| limit.min(cap.limit));
        let number_phases = number_phases
            .into_iter()
            .chain(cap.and_then(|cap| cap.number_phases))
            .min()
            .unwrap_or(self.defaults.number_phases);
        (limit, number_phases)
    }
}
