//! Outbound ports: collaborators the smart charging core reads from
//!
//! The device model and the transaction bookkeeping live outside the core;
//! adapters implement these traits.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::charging_profile::{ChargingRateUnit, STATION_WIDE_ID};

// ── CurrentPhaseType ───────────────────────────────────────────

/// Nature of the supply feeding an EVSE or the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrentPhaseType {
    AC,
    DC,
    #[default]
    Unknown,
}

impl CurrentPhaseType {
    /// Station-level phase type derived from the supply phase count.
    pub fn from_supply_phases(supply_phases: i32) -> Self {
        match supply_phases {
            1 | 3 => Self::AC,
            0 => Self::DC,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for CurrentPhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AC => f.write_str("AC"),
            Self::DC => f.write_str("DC"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

// ── ConfigurationProvider ──────────────────────────────────────

/// Read access to the device-model values smart charging depends on.
pub trait ConfigurationProvider: Send + Sync {
    /// Units accepted in a charging schedule.
    fn supported_charging_rate_units(&self) -> Vec<ChargingRateUnit>;

    /// `None` when the station does not report the capability.
    fn ac_phase_switching_supported(&self) -> Option<bool>;

    /// Supply phases of `evse_id`, or of the station for `STATION_WIDE_ID`.
    fn supply_phases(&self, evse_id: i32) -> i32;

    /// Whether `evse_id` names a configured EVSE.
    fn evse_exists(&self, evse_id: i32) -> bool;

    /// Ids of the configured EVSEs, ascending.
    fn evse_ids(&self) -> Vec<i32>;

    /// Phase type of `evse_id`; `STATION_WIDE_ID` resolves through the
    /// station supply phase count.
    fn current_phase_type(&self, evse_id: i32) -> CurrentPhaseType;

    fn is_charging_rate_unit_supported(&self, unit: ChargingRateUnit) -> bool {
        self.supported_charging_rate_units().contains(&unit)
    }

    fn station_phase_type(&self) -> CurrentPhaseType {
        CurrentPhaseType::from_supply_phases(self.supply_phases(STATION_WIDE_ID))
    }
}

// ── TransactionContext ─────────────────────────────────────────

/// The transaction currently open on an EVSE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTransaction {
    pub id: String,
    pub start_time: DateTime<Utc>,
}

/// Read access to the transactions open on each EVSE.
pub trait TransactionContext: Send + Sync {
    fn active_transaction(&self, evse_id: i32) -> Option<ActiveTransaction>;
}
