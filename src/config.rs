//! Configuration module
//!
//! Reads a TOML file (default `~/.config/ocpp-smart-charging/config.toml`).
//! Every section is optional and falls back to its defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::charging_profile::{
    ChargingRateUnit, CompositeScheduleDefaultLimits, DEFAULT_AND_MAX_NUMBER_PHASES,
};
use crate::domain::ports::CurrentPhaseType;
use crate::support::errors::ConfigError;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocpp-smart-charging")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub smart_charging: SmartChargingConfig,
    pub device_model: DeviceModelConfig,
}

impl AppConfig {
    /// Load and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sc = &self.smart_charging;
        if sc.default_limit_amps <= 0.0 || sc.default_limit_watts <= 0.0 {
            return Err(ConfigError::Invalid(
                "default limits must be greater than zero".to_string(),
            ));
        }
        if !(1..=DEFAULT_AND_MAX_NUMBER_PHASES).contains(&sc.default_number_phases) {
            return Err(ConfigError::Invalid(format!(
                "default_number_phases must be within 1..={}, got {}",
                DEFAULT_AND_MAX_NUMBER_PHASES, sc.default_number_phases
            )));
        }

        let dm = &self.device_model;
        if dm.supported_charging_rate_units.is_empty() {
            return Err(ConfigError::Invalid(
                "supported_charging_rate_units must not be empty".to_string(),
            ));
        }
        check_supply_phases("station", dm.supply_phases)?;

        let mut seen = HashSet::new();
        for evse in &dm.evses {
            if evse.id <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "EVSE ids must be greater than zero, got {}",
                    evse.id
                )));
            }
            if !seen.insert(evse.id) {
                return Err(ConfigError::Invalid(format!("duplicate EVSE id {}", evse.id)));
            }
            if let Some(phases) = evse.supply_phases {
                check_supply_phases(&format!("EVSE {}", evse.id), phases)?;
            }
        }
        Ok(())
    }
}

fn check_supply_phases(scope: &str, phases: i32) -> Result<(), ConfigError> {
    if (0..=DEFAULT_AND_MAX_NUMBER_PHASES).contains(&phases) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} supply_phases must be within 0..={}, got {}",
            scope, DEFAULT_AND_MAX_NUMBER_PHASES, phases
        )))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env-filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Smart charging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartChargingConfig {
    /// Limit in Amperes applied where no profile applies.
    pub default_limit_amps: f64,
    /// Limit in Watts applied where no profile applies.
    pub default_limit_watts: f64,
    /// Phases reported where no profile specifies them.
    pub default_number_phases: i32,
    /// JSON file backing the profile store; in-memory when absent.
    pub profile_store_path: Option<PathBuf>,
}

impl SmartChargingConfig {
    pub fn default_limits(&self) -> CompositeScheduleDefaultLimits {
        CompositeScheduleDefaultLimits {
            amps: self.default_limit_amps,
            watts: self.default_limit_watts,
            number_phases: self.default_number_phases,
        }
    }
}

impl Default for SmartChargingConfig {
    fn default() -> Self {
        let limits = CompositeScheduleDefaultLimits::default();
        Self {
            default_limit_amps: limits.amps,
            default_limit_watts: limits.watts,
            default_number_phases: limits.number_phases,
            profile_store_path: None,
        }
    }
}

/// Device model values consulted by profile validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceModelConfig {
    pub supported_charging_rate_units: Vec<ChargingRateUnit>,
    /// Left unset when the station does not report the capability.
    pub ac_phase_switching_supported: Option<bool>,
    /// Station supply phases: 0 for DC, 1 or 3 for AC.
    pub supply_phases: i32,
    pub evses: Vec<EvseConfig>,
}

impl Default for DeviceModelConfig {
    fn default() -> Self {
        Self {
            supported_charging_rate_units: vec![ChargingRateUnit::A, ChargingRateUnit::W],
            ac_phase_switching_supported: None,
            supply_phases: DEFAULT_AND_MAX_NUMBER_PHASES,
            evses: vec![EvseConfig {
                id: 1,
                phase_type: None,
                supply_phases: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvseConfig {
    pub id: i32,
    /// Inherits the station phase type when absent.
    #[serde(default)]
    pub phase_type: Option<CurrentPhaseType>,
    /// Inherits the station supply phases when absent.
    #[serde(default)]
    pub supply_phases: Option<i32>,
}
