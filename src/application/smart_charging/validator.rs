//! Charging profile validation
//!
//! The rules run as an ordered pipeline; the first rule that does not
//! return `Valid` decides the outcome. Validation never mutates the
//! profile: defaulting of `numberPhases` is a separate `normalize` step.

use std::sync::Arc;

use tracing::debug;

use super::index::{ProfileIndex, ProfileSlot};
use crate::domain::charging_profile::{
    AddChargingProfileSource, ChargingProfile, ChargingProfileKind, ChargingProfilePurpose,
    ChargingSchedule, ChargingSchedulePeriod, ProfileValidationResult, ReportedChargingProfile,
    DEFAULT_AND_MAX_NUMBER_PHASES, STATION_WIDE_ID,
};
use crate::domain::ports::{ConfigurationProvider, CurrentPhaseType, TransactionContext};

use ProfileValidationResult as R;

/// A profile under validation together with where it is going.
struct Submission<'a> {
    profile: &'a ChargingProfile,
    evse_id: i32,
    source: AddChargingProfileSource,
    existing: &'a ProfileIndex,
    /// The profile is already stored and is being re-checked.
    stored: bool,
}

type Rule = fn(&ProfileValidator, &Submission<'_>) -> ProfileValidationResult;

pub struct ProfileValidator {
    device_model: Arc<dyn ConfigurationProvider>,
    transactions: Arc<dyn TransactionContext>,
}

impl ProfileValidator {
    const RULES: [Rule; 6] = [
        Self::check_request_start_source,
        Self::check_evse_exists,
        Self::check_external_constraints_id,
        Self::check_purpose,
        Self::check_validity_overlap,
        Self::check_schedules,
    ];

    pub fn new(
        device_model: Arc<dyn ConfigurationProvider>,
        transactions: Arc<dyn TransactionContext>,
    ) -> Self {
        Self {
            device_model,
            transactions,
        }
    }

    /// Decide whether `profile` may be stored under `evse_id`, given the
    /// profiles already accepted.
    pub fn validate(
        &self,
        profile: &ChargingProfile,
        evse_id: i32,
        source: AddChargingProfileSource,
        existing: &ProfileIndex,
    ) -> ProfileValidationResult {
        self.run(&Submission {
            profile,
            evse_id,
            source,
            existing,
            stored: false,
        })
    }

    /// Re-check a stored record against the current device model and
    /// transaction state.
    pub fn revalidate(
        &self,
        record: &ReportedChargingProfile,
        existing: &ProfileIndex,
    ) -> ProfileValidationResult {
        self.run(&Submission {
            profile: &record.profile,
            evse_id: record.evse_id,
            source: AddChargingProfileSource::SetChargingProfile,
            existing,
            stored: true,
        })
    }

    fn run(&self, submission: &Submission<'_>) -> ProfileValidationResult {
        Self::RULES
            .iter()
            .map(|rule| rule(self, submission))
            .find(|result| !result.is_valid())
            .unwrap_or(R::Valid)
    }

    /// Fill in `numberPhases` on periods that target an AC supply and omit it.
    pub fn normalize(&self, mut profile: ChargingProfile, evse_id: i32) -> ChargingProfile {
        if self.phase_type(evse_id) != CurrentPhaseType::AC {
            return profile;
        }
        for period in profile
            .schedules
            .iter_mut()
            .flat_map(|schedule| schedule.periods.iter_mut())
            .filter(|period| period.number_phases.is_none())
        {
            debug!(
                profile_id = profile.id,
                number_phases = DEFAULT_AND_MAX_NUMBER_PHASES,
                "Defaulting numberPhases"
            );
            period.number_phases = Some(DEFAULT_AND_MAX_NUMBER_PHASES);
        }
        profile
    }

    fn phase_type(&self, evse_id: i32) -> CurrentPhaseType {
        if evse_id == STATION_WIDE_ID {
            self.device_model.station_phase_type()
        } else {
            self.device_model.current_phase_type(evse_id)
        }
    }

    // ── Rules ──────────────────────────────────────────────────

    fn check_request_start_source(&self, s: &Submission<'_>) -> ProfileValidationResult {
        if s.source == AddChargingProfileSource::RequestStartTransactionRequest
            && s.profile.purpose != ChargingProfilePurpose::TxProfile
        {
            R::RequestStartTransactionNonTxProfile
        } else {
            R::Valid
        }
    }

    fn check_evse_exists(&self, s: &Submission<'_>) -> ProfileValidationResult {
        if s.evse_id == STATION_WIDE_ID || self.device_model.evse_exists(s.evse_id) {
            R::Valid
        } else {
            R::EvseDoesNotExist
        }
    }

    fn check_external_constraints_id(&self, s: &Submission<'_>) -> ProfileValidationResult {
        if s.stored {
            return R::Valid;
        }
        match s.existing.get(s.profile.id) {
            Some(record)
                if record.profile.purpose
                    == ChargingProfilePurpose::ChargingStationExternalConstraints =>
            {
                R::ExistingChargingStationExternalConstraints
            }
            _ => R::Valid,
        }
    }

    fn check_purpose(&self, s: &Submission<'_>) -> ProfileValidationResult {
        match s.profile.purpose {
            ChargingProfilePurpose::ChargingStationMaxProfile => self.check_station_max(s),
            ChargingProfilePurpose::TxDefaultProfile => self.check_tx_default(s),
            ChargingProfilePurpose::TxProfile => self.check_tx(s),
            ChargingProfilePurpose::ChargingStationExternalConstraints => R::Valid,
        }
    }

    fn check_station_max(&self, s: &Submission<'_>) -> ProfileValidationResult {
        if s.evse_id > STATION_WIDE_ID {
            R::ChargingStationMaxProfileEvseIdGreaterThanZero
        } else if s.profile.kind == ChargingProfileKind::Relative {
            R::ChargingStationMaxProfileCannotBeRelative
        } else {
            R::Valid
        }
    }

    /// Station-wide and EVSE-specific TxDefault profiles exclude each other
    /// at the same stack level.
    fn check_tx_default(&self, s: &Submission<'_>) -> ProfileValidationResult {
        let incoming_station_wide = s.evse_id == STATION_WIDE_ID;
        let conflict = s.existing.iter().any(|record| {
            record.profile.purpose == ChargingProfilePurpose::TxDefaultProfile
                && record.profile.stack_level == s.profile.stack_level
                && record.profile.id != s.profile.id
                && (record.evse_id == STATION_WIDE_ID) != incoming_station_wide
        });
        if conflict {
            R::DuplicateTxDefaultProfileFound
        } else {
            R::Valid
        }
    }

    fn check_tx(&self, s: &Submission<'_>) -> ProfileValidationResult {
        let remote_start = s.source == AddChargingProfileSource::RequestStartTransactionRequest;

        // A remote start carries the profile before the transaction id exists.
        let transaction_id = match s.profile.transaction_id.as_deref() {
            Some(id) => Some(id),
            None if remote_start => None,
            None => return R::TxProfileMissingTransactionId,
        };
        if s.evse_id <= STATION_WIDE_ID {
            return R::TxProfileEvseIdNotGreaterThanZero;
        }
        let Some(transaction_id) = transaction_id.filter(|_| !remote_start) else {
            return R::Valid;
        };

        match self.transactions.active_transaction(s.evse_id) {
            None => return R::TxProfileEvseHasNoActiveTransaction,
            Some(active) if active.id != transaction_id => return R::TxProfileTransactionNotOnEvse,
            Some(_) => {}
        }

        let conflict = s.existing.iter().any(|record| {
            record.profile.purpose == ChargingProfilePurpose::TxProfile
                && record.profile.id != s.profile.id
                && record.profile.stack_level == s.profile.stack_level
                && (record.evse_id == s.evse_id
                    || record.profile.transaction_id.as_deref() == Some(transaction_id))
        });
        if conflict {
            R::TxProfileConflictingStackLevel
        } else {
            R::Valid
        }
    }

    /// TxProfiles are covered by the stack level conflict check instead.
    fn check_validity_overlap(&self, s: &Submission<'_>) -> ProfileValidationResult {
        if s.profile.purpose == ChargingProfilePurpose::TxProfile {
            return R::Valid;
        }
        let slot = ProfileSlot {
            evse_id: s.evse_id,
            purpose: s.profile.purpose,
            stack_level: s.profile.stack_level,
        };
        let overlapping = s
            .existing
            .in_slot(slot)
            .any(|record| record.profile.id != s.profile.id && record.profile.validity_overlaps(s.profile));
        if overlapping {
            R::DuplicateProfileValidityPeriod
        } else {
            R::Valid
        }
    }

    fn check_schedules(&self, s: &Submission<'_>) -> ProfileValidationResult {
        if s.profile.schedules.is_empty() {
            return R::ChargingProfileNoChargingSchedulePeriods;
        }
        let phase_type = self.phase_type(s.evse_id);
        let supply_phases = self.device_model.supply_phases(s.evse_id);

        s.profile
            .schedules
            .iter()
            .map(|schedule| self.check_schedule(s.profile.kind, schedule, phase_type, supply_phases))
            .find(|result| !result.is_valid())
            .unwrap_or(R::Valid)
    }

    fn check_schedule(
        &self,
        kind: ChargingProfileKind,
        schedule: &ChargingSchedule,
        phase_type: CurrentPhaseType,
        supply_phases: i32,
    ) -> ProfileValidationResult {
        let periods = &schedule.periods;
        let Some(first) = periods.first() else {
            return R::ChargingProfileNoChargingSchedulePeriods;
        };
        if first.start_period != 0 {
            return R::ChargingProfileFirstStartScheduleIsNotZero;
        }
        if periods.windows(2).any(|w| w[1].start_period <= w[0].start_period) {
            return R::ChargingSchedulePeriodsOutOfOrder;
        }
        if !self
            .device_model
            .is_charging_rate_unit_supported(schedule.charging_rate_unit)
        {
            return R::ChargingScheduleChargingRateUnitUnsupported;
        }
        match (kind, schedule.start_schedule) {
            (ChargingProfileKind::Absolute | ChargingProfileKind::Recurring, None) => {
                return R::ChargingProfileMissingRequiredStartSchedule;
            }
            (ChargingProfileKind::Relative, Some(_)) => {
                return R::ChargingProfileExtraneousStartSchedule;
            }
            _ => {}
        }

        periods
            .iter()
            .map(|period| self.check_period_phases(period, phase_type, supply_phases))
            .find(|result| !result.is_valid())
            .unwrap_or(R::Valid)
    }

    fn check_period_phases(
        &self,
        period: &ChargingSchedulePeriod,
        phase_type: CurrentPhaseType,
        supply_phases: i32,
    ) -> ProfileValidationResult {
        if phase_type == CurrentPhaseType::DC {
            return if period.number_phases.is_some() || period.phase_to_use.is_some() {
                R::ChargingSchedulePeriodExtraneousPhaseValues
            } else {
                R::Valid
            };
        }

        if period.phase_to_use.is_some() {
            if period.number_phases != Some(1) {
                return R::ChargingSchedulePeriodInvalidPhaseToUse;
            }
            if !self.device_model.ac_phase_switching_supported().unwrap_or(false) {
                return R::ChargingSchedulePeriodPhaseToUseACPhaseSwitchingUnsupported;
            }
        }

        if phase_type == CurrentPhaseType::AC
            && period.number_phases.is_some_and(|phases| phases > supply_phases)
        {
            return R::ChargingSchedulePeriodUnsupportedNumberPhases;
        }

        R::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::smart_charging::test_support::{
        base_time, device_config, transactions, ts, ProfileBuilder,
    };
    use crate::config::EvseConfig;
    use crate::domain::charging_profile::{ChargingLimitSource, ChargingRateUnit, RecurrencyKind};
    use crate::infrastructure::{InMemoryTransactionContext, StaticDeviceModel};
    use rstest::rstest;

    use crate::domain::charging_profile::AddChargingProfileSource::{
        RequestStartTransactionRequest as Rst, SetChargingProfile as Set,
    };

    struct Fixture {
        validator: ProfileValidator,
        transactions: Arc<InMemoryTransactionContext>,
        existing: ProfileIndex,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_device_model(device_config())
        }

        fn with_device_model(config: crate::config::DeviceModelConfig) -> Self {
            let transactions = transactions();
            Self {
                validator: ProfileValidator::new(
                    Arc::new(StaticDeviceModel::from_config(&config)),
                    transactions.clone(),
                ),
                transactions,
                existing: ProfileIndex::new(),
            }
        }

        fn store(&mut self, evse_id: i32, profile: ChargingProfile) {
            self.existing.insert(ReportedChargingProfile {
                evse_id,
                profile,
                source: ChargingLimitSource::Cso,
            });
        }

        fn check(&self, profile: &ChargingProfile, evse_id: i32) -> ProfileValidationResult {
            self.validator.validate(profile, evse_id, Set, &self.existing)
        }
    }

    fn dc_station() -> crate::config::DeviceModelConfig {
        let mut config = device_config();
        config.supply_phases = 0;
        config
    }

    // ── Scope and purpose ──────────────────────────────────────

    #[rstest]
    #[case(0, R::Valid)]
    #[case(1, R::Valid)]
    #[case(3, R::EvseDoesNotExist)]
    #[case(-1, R::EvseDoesNotExist)]
    fn evse_must_exist(#[case] evse_id: i32, #[case] expected: ProfileValidationResult) {
        let fixture = Fixture::new();
        assert_eq!(fixture.check(&ProfileBuilder::tx_default(1).build(), evse_id), expected);
    }

    #[test]
    fn existing_external_constraints_cannot_be_replaced() {
        let mut fixture = Fixture::new();
        fixture.store(0, ProfileBuilder::external(5).build());
        assert_eq!(
            fixture.check(&ProfileBuilder::tx_default(5).build(), 1),
            R::ExistingChargingStationExternalConstraints
        );
    }

    #[rstest]
    #[case(ProfileBuilder::station_max(1), 1, R::ChargingStationMaxProfileEvseIdGreaterThanZero)]
    #[case(ProfileBuilder::station_max(1).relative(), 0, R::ChargingStationMaxProfileCannotBeRelative)]
    #[case(ProfileBuilder::station_max(1), 0, R::Valid)]
    #[case(ProfileBuilder::station_max(1).recurring(RecurrencyKind::Daily), 0, R::Valid)]
    fn station_max_rules(
        #[case] builder: ProfileBuilder,
        #[case] evse_id: i32,
        #[case] expected: ProfileValidationResult,
    ) {
        assert_eq!(Fixture::new().check(&builder.build(), evse_id), expected);
    }

    #[rstest]
    #[case(0, 1, R::DuplicateTxDefaultProfileFound)]
    #[case(1, 0, R::DuplicateTxDefaultProfileFound)]
    #[case(1, 1, R::DuplicateProfileValidityPeriod)]
    #[case(1, 2, R::Valid)]
    fn tx_default_scopes_exclude_each_other(
        #[case] stored_on: i32,
        #[case] submitted_to: i32,
        #[case] expected: ProfileValidationResult,
    ) {
        let mut fixture = Fixture::new();
        fixture.store(stored_on, ProfileBuilder::tx_default(1).stack_level(2).build());
        let incoming = ProfileBuilder::tx_default(2).stack_level(2).build();
        assert_eq!(fixture.check(&incoming, submitted_to), expected);
    }

    #[test]
    fn tx_default_other_stack_level_is_valid() {
        let mut fixture = Fixture::new();
        fixture.store(0, ProfileBuilder::tx_default(1).stack_level(2).build());
        assert_eq!(fixture.check(&ProfileBuilder::tx_default(2).stack_level(3).build(), 1), R::Valid);
    }

    #[test]
    fn tx_default_same_id_replaces_across_scopes() {
        let mut fixture = Fixture::new();
        fixture.store(0, ProfileBuilder::tx_default(1).build());
        assert_eq!(fixture.check(&ProfileBuilder::tx_default(1).build(), 1), R::Valid);
    }

    // ── TxProfile ──────────────────────────────────────────────

    #[test]
    fn tx_profile_requires_transaction_id() {
        let fixture = Fixture::new();
        let profile = ProfileBuilder::tx(1, "tx-A").transaction_id(None).build();
        assert_eq!(fixture.check(&profile, 1), R::TxProfileMissingTransactionId);
    }

    #[test]
    fn tx_profile_requires_evse() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture.check(&ProfileBuilder::tx(1, "tx-A").build(), 0),
            R::TxProfileEvseIdNotGreaterThanZero
        );
    }

    #[test]
    fn tx_profile_requires_active_transaction() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture.check(&ProfileBuilder::tx(1, "tx-A").build(), 1),
            R::TxProfileEvseHasNoActiveTransaction
        );
    }

    #[test]
    fn tx_profile_transaction_must_be_on_evse() {
        let fixture = Fixture::new();
        fixture.transactions.start_transaction(1, "tx-B", base_time());
        assert_eq!(
            fixture.check(&ProfileBuilder::tx(1, "tx-A").build(), 1),
            R::TxProfileTransactionNotOnEvse
        );
        fixture.transactions.start_transaction(1, "tx-A", base_time());
        assert_eq!(fixture.check(&ProfileBuilder::tx(1, "tx-A").build(), 1), R::Valid);
    }

    #[test]
    fn tx_profile_conflicting_stack_level() {
        let mut fixture = Fixture::new();
        fixture.transactions.start_transaction(1, "tx-A", base_time());
        fixture.store(1, ProfileBuilder::tx(1, "tx-A").stack_level(1).build());

        let same_level = ProfileBuilder::tx(2, "tx-A").stack_level(1).build();
        assert_eq!(fixture.check(&same_level, 1), R::TxProfileConflictingStackLevel);

        let other_level = ProfileBuilder::tx(2, "tx-A").stack_level(2).build();
        assert_eq!(fixture.check(&other_level, 1), R::Valid);

        let replacement = ProfileBuilder::tx(1, "tx-A").stack_level(1).limit(6.0).build();
        assert_eq!(fixture.check(&replacement, 1), R::Valid);
    }

    #[test]
    fn stale_tx_profile_on_evse_conflicts() {
        let mut fixture = Fixture::new();
        fixture.store(1, ProfileBuilder::tx(1, "tx-old").build());
        fixture.transactions.start_transaction(1, "tx-A", base_time());
        assert_eq!(
            fixture.check(&ProfileBuilder::tx(2, "tx-A").build(), 1),
            R::TxProfileConflictingStackLevel
        );
    }

    // A stored TxProfile at the same stack level conflicts when it sits on
    // the same EVSE or belongs to the same transaction.
    #[rstest]
    #[case(1, "tx-old", R::TxProfileConflictingStackLevel)]
    #[case(2, "tx-A", R::TxProfileConflictingStackLevel)]
    #[case(2, "tx-B", R::Valid)]
    fn tx_profile_conflict_scope(
        #[case] stored_on: i32,
        #[case] stored_transaction: &str,
        #[case] expected: ProfileValidationResult,
    ) {
        let mut fixture = Fixture::new();
        fixture.store(stored_on, ProfileBuilder::tx(1, stored_transaction).build());
        fixture.transactions.start_transaction(1, "tx-A", base_time());
        assert_eq!(fixture.check(&ProfileBuilder::tx(2, "tx-A").build(), 1), expected);
    }

    #[test]
    fn remote_start_skips_transaction_checks() {
        let fixture = Fixture::new();
        let profile = ProfileBuilder::tx(1, "tx-A").transaction_id(None).build();
        assert_eq!(fixture.validator.validate(&profile, 1, Rst, &fixture.existing), R::Valid);
        assert_eq!(
            fixture.validator.validate(&profile, 0, Rst, &fixture.existing),
            R::TxProfileEvseIdNotGreaterThanZero
        );
    }

    #[test]
    fn remote_start_only_accepts_tx_profiles() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture
                .validator
                .validate(&ProfileBuilder::tx_default(1).build(), 1, Rst, &fixture.existing),
            R::RequestStartTransactionNonTxProfile
        );
    }

    // ── Validity periods ───────────────────────────────────────

    #[rstest]
    #[case(ts("2024-01-01T00:00:00Z"), ts("2024-01-10T00:00:00Z"), R::DuplicateProfileValidityPeriod)]
    #[case(ts("2024-01-20T00:00:00Z"), ts("2024-02-01T00:00:00Z"), R::DuplicateProfileValidityPeriod)]
    #[case(ts("2024-02-01T00:00:00Z"), ts("2024-03-01T00:00:00Z"), R::Valid)]
    fn overlapping_validity_in_same_slot(
        #[case] from: chrono::DateTime<chrono::Utc>,
        #[case] to: chrono::DateTime<chrono::Utc>,
        #[case] expected: ProfileValidationResult,
    ) {
        let mut fixture = Fixture::new();
        fixture.store(
            0,
            ProfileBuilder::station_max(1)
                .valid_from(ts("2024-01-05T00:00:00Z"))
                .valid_to(ts("2024-01-20T00:00:00Z"))
                .build(),
        );
        let incoming = ProfileBuilder::station_max(2).valid_from(from).valid_to(to).build();
        assert_eq!(fixture.check(&incoming, 0), expected);
    }

    #[test]
    fn overlap_ignores_other_stack_levels() {
        let mut fixture = Fixture::new();
        fixture.store(0, ProfileBuilder::station_max(1).build());
        assert_eq!(fixture.check(&ProfileBuilder::station_max(2).stack_level(1).build(), 0), R::Valid);
    }

    // ── Schedules ──────────────────────────────────────────────

    #[rstest]
    #[case(ProfileBuilder::tx_default(1).without_schedules(), R::ChargingProfileNoChargingSchedulePeriods)]
    #[case(ProfileBuilder::tx_default(1).periods(vec![]), R::ChargingProfileNoChargingSchedulePeriods)]
    #[case(ProfileBuilder::tx_default(1).limits(&[(10, 16.0)]), R::ChargingProfileFirstStartScheduleIsNotZero)]
    #[case(
        ProfileBuilder::tx_default(1).limits(&[(0, 16.0), (600, 8.0), (600, 4.0)]),
        R::ChargingSchedulePeriodsOutOfOrder
    )]
    #[case(
        ProfileBuilder::tx_default(1).limits(&[(0, 16.0), (600, 8.0), (300, 4.0)]),
        R::ChargingSchedulePeriodsOutOfOrder
    )]
    #[case(ProfileBuilder::tx_default(1).start_schedule(None), R::ChargingProfileMissingRequiredStartSchedule)]
    #[case(
        ProfileBuilder::tx_default(1).recurring(RecurrencyKind::Weekly).start_schedule(None),
        R::ChargingProfileMissingRequiredStartSchedule
    )]
    #[case(
        ProfileBuilder::tx_default(1).kind(ChargingProfileKind::Relative),
        R::ChargingProfileExtraneousStartSchedule
    )]
    #[case(ProfileBuilder::tx_default(1).relative(), R::Valid)]
    fn schedule_structure(#[case] builder: ProfileBuilder, #[case] expected: ProfileValidationResult) {
        assert_eq!(Fixture::new().check(&builder.build(), 1), expected);
    }

    #[test]
    fn unsupported_rate_unit() {
        let mut config = device_config();
        config.supported_charging_rate_units = vec![ChargingRateUnit::A];
        let fixture = Fixture::with_device_model(config);
        let profile = ProfileBuilder::tx_default(1).unit(ChargingRateUnit::W).build();
        assert_eq!(fixture.check(&profile, 1), R::ChargingScheduleChargingRateUnitUnsupported);
    }

    #[test]
    fn every_schedule_is_checked() {
        let mut profile = ProfileBuilder::tx_default(1).build();
        let mut second = profile.schedules[0].clone();
        second.periods[0].start_period = 5;
        profile.schedules.push(second);
        assert_eq!(Fixture::new().check(&profile, 1), R::ChargingProfileFirstStartScheduleIsNotZero);
    }

    // ── Phases ─────────────────────────────────────────────────

    fn phased(number_phases: Option<i32>, phase_to_use: Option<i32>) -> ChargingProfile {
        let period = ChargingSchedulePeriod {
            start_period: 0,
            limit: 16.0,
            number_phases,
            phase_to_use,
        };
        ProfileBuilder::tx_default(1).periods(vec![period]).build()
    }

    #[rstest]
    #[case(Some(3), Some(1), R::ChargingSchedulePeriodInvalidPhaseToUse)]
    #[case(None, Some(1), R::ChargingSchedulePeriodInvalidPhaseToUse)]
    #[case(Some(1), Some(1), R::ChargingSchedulePeriodPhaseToUseACPhaseSwitchingUnsupported)]
    #[case(Some(1), None, R::Valid)]
    #[case(None, None, R::Valid)]
    fn ac_phase_to_use_without_switching(
        #[case] number_phases: Option<i32>,
        #[case] phase_to_use: Option<i32>,
        #[case] expected: ProfileValidationResult,
    ) {
        assert_eq!(Fixture::new().check(&phased(number_phases, phase_to_use), 1), expected);
    }

    #[rstest]
    #[case(Some(false), R::ChargingSchedulePeriodPhaseToUseACPhaseSwitchingUnsupported)]
    #[case(Some(true), R::Valid)]
    fn ac_phase_switching_support(
        #[case] supported: Option<bool>,
        #[case] expected: ProfileValidationResult,
    ) {
        let mut config = device_config();
        config.ac_phase_switching_supported = supported;
        let fixture = Fixture::with_device_model(config);
        assert_eq!(fixture.check(&phased(Some(1), Some(2)), 1), expected);
    }

    #[test]
    fn ac_number_phases_above_supply() {
        let mut config = device_config();
        config.evses[0] = EvseConfig {
            id: 1,
            phase_type: None,
            supply_phases: Some(1),
        };
        let fixture = Fixture::with_device_model(config);
        assert_eq!(
            fixture.check(&phased(Some(3), None), 1),
            R::ChargingSchedulePeriodUnsupportedNumberPhases
        );
        assert_eq!(fixture.check(&phased(Some(3), None), 2), R::Valid);
    }

    #[rstest]
    #[case(Some(3), None, R::ChargingSchedulePeriodExtraneousPhaseValues)]
    #[case(None, Some(1), R::ChargingSchedulePeriodExtraneousPhaseValues)]
    #[case(None, None, R::Valid)]
    fn dc_rejects_phase_values(
        #[case] number_phases: Option<i32>,
        #[case] phase_to_use: Option<i32>,
        #[case] expected: ProfileValidationResult,
    ) {
        let fixture = Fixture::with_device_model(dc_station());
        assert_eq!(fixture.check(&phased(number_phases, phase_to_use), 1), expected);
        assert_eq!(fixture.check(&phased(number_phases, phase_to_use), 0), expected);
    }

    #[test]
    fn normalize_defaults_number_phases_on_ac_only() {
        let ac = Fixture::new();
        let normalized = ac.validator.normalize(phased(None, None), 1);
        assert_eq!(normalized.schedules[0].periods[0].number_phases, Some(3));

        let kept = ac.validator.normalize(phased(Some(1), None), 1);
        assert_eq!(kept.schedules[0].periods[0].number_phases, Some(1));

        let dc = Fixture::with_device_model(dc_station());
        let untouched = dc.validator.normalize(phased(None, None), 1);
        assert_eq!(untouched.schedules[0].periods[0].number_phases, None);
    }

    #[test]
    fn revalidate_keeps_stored_external_constraints() {
        let mut fixture = Fixture::new();
        let record = ReportedChargingProfile {
            evse_id: 0,
            profile: ProfileBuilder::external(7).build(),
            source: ChargingLimitSource::Ems,
        };
        fixture.store(0, record.profile.clone());
        assert_eq!(fixture.validator.revalidate(&record, &fixture.existing), R::Valid);
    }

    #[test]
    fn revalidate_drops_tx_profile_after_transaction_ends() {
        let mut fixture = Fixture::new();
        fixture.transactions.start_transaction(1, "tx-A", base_time());
        let record = ReportedChargingProfile {
            evse_id: 1,
            profile: ProfileBuilder::tx(3, "tx-A").build(),
            source: ChargingLimitSource::Cso,
        };
        fixture.store(1, record.profile.clone());
        assert_eq!(fixture.validator.revalidate(&record, &fixture.existing), R::Valid);

        fixture.transactions.end_transaction(1);
        assert_eq!(
            fixture.validator.revalidate(&record, &fixture.existing),
            R::TxProfileEvseHasNoActiveTransaction
        );
    }
}
