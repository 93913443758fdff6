//! Smart charging facade used by the protocol handlers

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::composite::CompositeScheduleCalculator;
use super::store::ProfileStore;
use super::validator::ProfileValidator;
use crate::config::AppConfig;
use crate::domain::charging_profile::{
    ChargingProfile, ChargingRateUnit, CompositeSchedule, CompositeScheduleDefaultLimits,
    ProfilePersistence, ProfileValidationResult, StatusInfo, STATION_WIDE_ID,
};
use crate::domain::ports::{ConfigurationProvider, TransactionContext};
use crate::infrastructure::{FileProfilePersistence, InMemoryProfilePersistence, StaticDeviceModel};
use crate::support::errors::StorageResult;

/// Result of a GetCompositeSchedule request.
#[derive(Debug, Clone, PartialEq)]
pub enum GetCompositeScheduleOutcome {
    Accepted(CompositeSchedule),
    Rejected(StatusInfo),
}

pub struct SmartChargingService {
    store: ProfileStore,
    calculator: CompositeScheduleCalculator,
    device_model: Arc<dyn ConfigurationProvider>,
}

impl SmartChargingService {
    pub fn new(
        device_model: Arc<dyn ConfigurationProvider>,
        transactions: Arc<dyn TransactionContext>,
        persistence: Arc<dyn ProfilePersistence>,
        defaults: CompositeScheduleDefaultLimits,
    ) -> StorageResult<Self> {
        let validator = ProfileValidator::new(device_model.clone(), transactions.clone());
        Ok(Self {
            store: ProfileStore::load(validator, persistence)?,
            calculator: CompositeScheduleCalculator::new(transactions, defaults),
            device_model,
        })
    }

    /// Wire the service from configuration. Profiles go to a file when
    /// `smart_charging.profile_store_path` is set and stay in memory otherwise.
    pub fn from_config(
        config: &AppConfig,
        transactions: Arc<dyn TransactionContext>,
    ) -> StorageResult<Self> {
        let persistence: Arc<dyn ProfilePersistence> =
            match &config.smart_charging.profile_store_path {
                Some(path) => Arc::new(FileProfilePersistence::open(path.clone())?),
                None => {
                    warn!("No profile store path configured, charging profiles will not survive a restart");
                    Arc::new(InMemoryProfilePersistence::new())
                }
            };

        Self::new(
            Arc::new(StaticDeviceModel::from_config(&config.device_model)),
            transactions,
            persistence,
            config.smart_charging.default_limits(),
        )
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn calculator(&self) -> &CompositeScheduleCalculator {
        &self.calculator
    }

    /// Composite schedule of `evse_id` for `duration_s` seconds from `start`.
    /// Without a unit the first supported one is used. For the station
    /// (`evse_id` 0) the limits of all EVSEs are summed under the
    /// `ChargingStationMaxProfile`.
    pub fn get_composite_schedule(
        &self,
        evse_id: i32,
        start: DateTime<Utc>,
        duration_s: i32,
        unit: Option<ChargingRateUnit>,
    ) -> GetCompositeScheduleOutcome {
        if evse_id != STATION_WIDE_ID && !self.device_model.evse_exists(evse_id) {
            warn!(evse_id, "Composite schedule requested for unknown EVSE");
            return GetCompositeScheduleOutcome::Rejected(StatusInfo::from_result(
                ProfileValidationResult::EvseDoesNotExist,
            ));
        }

        let unit = match unit {
            Some(unit) => unit,
            None => self
                .device_model
                .supported_charging_rate_units()
                .first()
                .copied()
                .unwrap_or(ChargingRateUnit::A),
        };
        if !self.device_model.is_charging_rate_unit_supported(unit) {
            warn!(evse_id, unit = %unit, "Composite schedule requested in unsupported unit");
            return GetCompositeScheduleOutcome::Rejected(StatusInfo::from_result(
                ProfileValidationResult::ChargingScheduleChargingRateUnitUnsupported,
            ));
        }

        let end = start + Duration::seconds(i64::from(duration_s));
        let profiles = self.store.get_valid_profiles(evse_id);
        if evse_id != STATION_WIDE_ID {
            return GetCompositeScheduleOutcome::Accepted(
                self.calculator
                    .calculate_composite_schedule(&profiles, start, end, evse_id, unit),
            );
        }

        let evse_profiles: Vec<(i32, Vec<ChargingProfile>)> = self
            .device_model
            .evse_ids()
            .into_iter()
            .map(|id| (id, self.store.get_valid_profiles(id)))
            .collect();
        GetCompositeScheduleOutcome::Accepted(self.calculator.calculate_station_composite_schedule(
            &profiles,
            &evse_profiles,
            start,
            end,
            unit,
        ))
    }

    /// Composite schedules of the station and of every EVSE, station first.
    /// Schedules that cannot be produced are logged and left out.
    pub fn get_all_composite_schedules(
        &self,
        start: DateTime<Utc>,
        duration_s: i32,
        unit: ChargingRateUnit,
    ) -> Vec<CompositeSchedule> {
        std::iter::once(STATION_WIDE_ID)
            .chain(self.device_model.evse_ids())
            .filter_map(|evse_id| {
                match self.get_composite_schedule(evse_id, start, duration_s, Some(unit)) {
                    GetCompositeScheduleOutcome::Accepted(schedule) => Some(schedule),
                    GetCompositeScheduleOutcome::Rejected(status_info) => {
                        warn!(
                            evse_id,
                            reason = %status_info.reason_code,
                            "Could not calculate composite schedule"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Drop the transaction's TxProfiles once it has ended.
    pub fn on_transaction_ended(&self, transaction_id: &str) -> StorageResult<usize> {
        let removed = self.store.delete_transaction_tx_profiles(transaction_id)?;
        info!(transaction_id, removed, "Transaction ended");
        Ok(removed)
    }
}
