//! Fixtures shared by the smart charging tests

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{DeviceModelConfig, EvseConfig};
use crate::domain::charging_profile::{
    ChargingProfile, ChargingProfileKind, ChargingProfilePurpose, ChargingRateUnit,
    ChargingSchedule, ChargingSchedulePeriod, RecurrencyKind,
};
use crate::infrastructure::{InMemoryTransactionContext, StaticDeviceModel};

pub fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

/// Anchor used by builder-made schedules.
pub fn base_time() -> DateTime<Utc> {
    ts("2024-01-17T00:00:00Z")
}

/// AC station, three phases, EVSEs 1 and 2, both units supported.
pub fn device_config() -> DeviceModelConfig {
    DeviceModelConfig {
        supported_charging_rate_units: vec![ChargingRateUnit::A, ChargingRateUnit::W],
        ac_phase_switching_supported: None,
        supply_phases: 3,
        evses: vec![
            EvseConfig {
                id: 1,
                phase_type: None,
                supply_phases: None,
            },
            EvseConfig {
                id: 2,
                phase_type: None,
                supply_phases: None,
            },
        ],
    }
}

pub fn device_model() -> Arc<StaticDeviceModel> {
    Arc::new(StaticDeviceModel::from_config(&device_config()))
}

pub fn transactions() -> Arc<InMemoryTransactionContext> {
    Arc::new(InMemoryTransactionContext::new())
}

/// Builds an Absolute profile at stack level 0 with a single 32 A period
/// anchored at `base_time()`, then lets tests override what they need.
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    profile: ChargingProfile,
}

impl ProfileBuilder {
    pub fn new(id: i32, purpose: ChargingProfilePurpose) -> Self {
        let mut schedule =
            ChargingSchedule::new(ChargingRateUnit::A, vec![ChargingSchedulePeriod::new(0, 32.0)]);
        schedule.start_schedule = Some(base_time());
        Self {
            profile: ChargingProfile {
                id,
                stack_level: 0,
                purpose,
                kind: ChargingProfileKind::Absolute,
                recurrency_kind: None,
                valid_from: None,
                valid_to: None,
                transaction_id: None,
                schedules: vec![schedule],
            },
        }
    }

    pub fn tx_default(id: i32) -> Self {
        Self::new(id, ChargingProfilePurpose::TxDefaultProfile)
    }

    pub fn station_max(id: i32) -> Self {
        Self::new(id, ChargingProfilePurpose::ChargingStationMaxProfile)
    }

    pub fn external(id: i32) -> Self {
        Self::new(id, ChargingProfilePurpose::ChargingStationExternalConstraints)
    }

    pub fn tx(id: i32, transaction_id: &str) -> Self {
        Self::new(id, ChargingProfilePurpose::TxProfile).transaction_id(Some(transaction_id))
    }

    pub fn stack_level(mut self, stack_level: i32) -> Self {
        self.profile.stack_level = stack_level;
        self
    }

    pub fn transaction_id(mut self, transaction_id: Option<&str>) -> Self {
        self.profile.transaction_id = transaction_id.map(str::to_string);
        self
    }

    pub fn kind(mut self, kind: ChargingProfileKind) -> Self {
        self.profile.kind = kind;
        self
    }

    /// Relative kind without a start schedule.
    pub fn relative(self) -> Self {
        self.kind(ChargingProfileKind::Relative).start_schedule(None)
    }

    pub fn recurring(mut self, recurrency: RecurrencyKind) -> Self {
        self.profile.kind = ChargingProfileKind::Recurring;
        self.profile.recurrency_kind = Some(recurrency);
        self
    }

    pub fn valid_from(mut self, valid_from: DateTime<Utc>) -> Self {
        self.profile.valid_from = Some(valid_from);
        self
    }

    pub fn valid_to(mut self, valid_to: DateTime<Utc>) -> Self {
        self.profile.valid_to = Some(valid_to);
        self
    }

    pub fn unit(mut self, unit: ChargingRateUnit) -> Self {
        for schedule in &mut self.profile.schedules {
            schedule.charging_rate_unit = unit;
        }
        self
    }

    pub fn start_schedule(mut self, start: Option<DateTime<Utc>>) -> Self {
        for schedule in &mut self.profile.schedules {
            schedule.start_schedule = start;
        }
        self
    }

    pub fn duration(mut self, seconds: i32) -> Self {
        for schedule in &mut self.profile.schedules {
            schedule.duration = Some(seconds);
        }
        self
    }

    pub fn periods(mut self, periods: Vec<ChargingSchedulePeriod>) -> Self {
        for schedule in &mut self.profile.schedules {
            schedule.periods = periods.clone();
        }
        self
    }

    /// Periods from `(start_period, limit)` pairs.
    pub fn limits(self, limits: &[(i32, f64)]) -> Self {
        self.periods(
            limits
                .iter()
                .map(|&(start, limit)| ChargingSchedulePeriod::new(start, limit))
                .collect(),
        )
    }

    pub fn limit(self, limit: f64) -> Self {
        self.limits(&[(0, limit)])
    }

    pub fn without_schedules(mut self) -> Self {
        self.profile.schedules.clear();
        self
    }

    pub fn build(self) -> ChargingProfile {
        self.profile
    }
}
