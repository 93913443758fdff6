//! Device model backed by the static configuration file

use std::collections::HashMap;

use crate::config::{DeviceModelConfig, EvseConfig};
use crate::domain::charging_profile::{ChargingRateUnit, STATION_WIDE_ID};
use crate::domain::ports::{ConfigurationProvider, CurrentPhaseType};

#[derive(Debug, Clone)]
pub struct StaticDeviceModel {
    supported_units: Vec<ChargingRateUnit>,
    ac_phase_switching_supported: Option<bool>,
    supply_phases: i32,
    evses: HashMap<i32, EvseConfig>,
}

impl StaticDeviceModel {
    pub fn from_config(config: &DeviceModelConfig) -> Self {
        Self {
            supported_units: config.supported_charging_rate_units.clone(),
            ac_phase_switching_supported: config.ac_phase_switching_supported,
            supply_phases: config.supply_phases,
            evses: config
                .evses
                .iter()
                .map(|evse| (evse.id, evse.clone()))
                .collect(),
        }
    }
}

impl Default for StaticDeviceModel {
    fn default() -> Self {
        Self::from_config(&DeviceModelConfig::default())
    }
}

impl ConfigurationProvider for StaticDeviceModel {
    fn supported_charging_rate_units(&self) -> Vec<ChargingRateUnit> {
        self.supported_units.clone()
    }

    fn ac_phase_switching_supported(&self) -> Option<bool> {
        self.ac_phase_switching_supported
    }

    fn supply_phases(&self, evse_id: i32) -> i32 {
        if evse_id == STATION_WIDE_ID {
            return self.supply_phases;
        }
        self.evses
            .get(&evse_id)
            .and_then(|evse| evse.supply_phases)
            .unwrap_or(self.supply_phases)
    }

    fn evse_exists(&self, evse_id: i32) -> bool {
        self.evses.contains_key(&evse_id)
    }

    fn evse_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.evses.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn current_phase_type(&self, evse_id: i32) -> CurrentPhaseType {
        let Some(evse) = self.evses.get(&evse_id) else {
            return self.station_phase_type();
        };
        match (evse.phase_type, evse.supply_phases) {
            (Some(phase_type), _) => phase_type,
            (None, Some(phases)) => CurrentPhaseType::from_supply_phases(phases),
            (None, None) => self.station_phase_type(),
        }
    }
}
