//! Outcome vocabulary of charging profile validation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of validating a charging profile. `Valid` is the only success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileValidationResult {
    Valid,
    EvseDoesNotExist,
    ExistingChargingStationExternalConstraints,
    TxProfileMissingTransactionId,
    TxProfileEvseIdNotGreaterThanZero,
    TxProfileTransactionNotOnEvse,
    TxProfileEvseHasNoActiveTransaction,
    TxProfileConflictingStackLevel,
    ChargingProfileNoChargingSchedulePeriods,
    ChargingProfileFirstStartScheduleIsNotZero,
    ChargingProfileMissingRequiredStartSchedule,
    ChargingProfileExtraneousStartSchedule,
    ChargingScheduleChargingRateUnitUnsupported,
    ChargingSchedulePeriodsOutOfOrder,
    ChargingSchedulePeriodInvalidPhaseToUse,
    ChargingSchedulePeriodUnsupportedNumberPhases,
    ChargingSchedulePeriodExtraneousPhaseValues,
    ChargingSchedulePeriodPhaseToUseACPhaseSwitchingUnsupported,
    ChargingStationMaxProfileCannotBeRelative,
    ChargingStationMaxProfileEvseIdGreaterThanZero,
    DuplicateTxDefaultProfileFound,
    DuplicateProfileValidityPeriod,
    RequestStartTransactionNonTxProfile,
}

impl ProfileValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::EvseDoesNotExist => "EvseDoesNotExist",
            Self::ExistingChargingStationExternalConstraints => {
                "ExistingChargingStationExternalConstraints"
            }
            Self::TxProfileMissingTransactionId => "TxProfileMissingTransactionId",
            Self::TxProfileEvseIdNotGreaterThanZero => "TxProfileEvseIdNotGreaterThanZero",
            Self::TxProfileTransactionNotOnEvse => "TxProfileTransactionNotOnEvse",
            Self::TxProfileEvseHasNoActiveTransaction => "TxProfileEvseHasNoActiveTransaction",
            Self::TxProfileConflictingStackLevel => "TxProfileConflictingStackLevel",
            Self::ChargingProfileNoChargingSchedulePeriods => {
                "ChargingProfileNoChargingSchedulePeriods"
            }
            Self::ChargingProfileFirstStartScheduleIsNotZero => {
                "ChargingProfileFirstStartScheduleIsNotZero"
            }
            Self::ChargingProfileMissingRequiredStartSchedule => {
                "ChargingProfileMissingRequiredStartSchedule"
            }
            Self::ChargingProfileExtraneousStartSchedule => "ChargingProfileExtraneousStartSchedule",
            Self::ChargingScheduleChargingRateUnitUnsupported => {
                "ChargingScheduleChargingRateUnitUnsupported"
            }
            Self::ChargingSchedulePeriodsOutOfOrder => "ChargingSchedulePeriodsOutOfOrder",
            Self::ChargingSchedulePeriodInvalidPhaseToUse => {
                "ChargingSchedulePeriodInvalidPhaseToUse"
            }
            Self::ChargingSchedulePeriodUnsupportedNumberPhases => {
                "ChargingSchedulePeriodUnsupportedNumberPhases"
            }
            Self::ChargingSchedulePeriodExtraneousPhaseValues => {
                "ChargingSchedulePeriodExtraneousPhaseValues"
            }
            Self::ChargingSchedulePeriodPhaseToUseACPhaseSwitchingUnsupported => {
                "ChargingSchedulePeriodPhaseToUseACPhaseSwitchingUnsupported"
            }
            Self::ChargingStationMaxProfileCannotBeRelative => {
                "ChargingStationMaxProfileCannotBeRelative"
            }
            Self::ChargingStationMaxProfileEvseIdGreaterThanZero => {
                "ChargingStationMaxProfileEvseIdGreaterThanZero"
            }
            Self::DuplicateTxDefaultProfileFound => "DuplicateTxDefaultProfileFound",
            Self::DuplicateProfileValidityPeriod => "DuplicateProfileValidityPeriod",
            Self::RequestStartTransactionNonTxProfile => "RequestStartTransactionNonTxProfile",
        }
    }

    /// Protocol `reasonCode` reported in `StatusInfo`.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Valid => "NoError",
            Self::DuplicateProfileValidityPeriod
            | Self::DuplicateTxDefaultProfileFound
            | Self::ExistingChargingStationExternalConstraints => "DuplicateProfile",
            Self::TxProfileTransactionNotOnEvse | Self::TxProfileEvseHasNoActiveTransaction => {
                "TxNotFound"
            }
            Self::TxProfileConflictingStackLevel => "InvalidStackLevel",
            Self::ChargingScheduleChargingRateUnitUnsupported => "UnsupportedRateUnit",
            Self::ChargingProfileNoChargingSchedulePeriods
            | Self::ChargingProfileFirstStartScheduleIsNotZero
            | Self::ChargingProfileMissingRequiredStartSchedule
            | Self::ChargingProfileExtraneousStartSchedule
            | Self::ChargingSchedulePeriodsOutOfOrder
            | Self::ChargingSchedulePeriodInvalidPhaseToUse
            | Self::ChargingSchedulePeriodUnsupportedNumberPhases
            | Self::ChargingSchedulePeriodExtraneousPhaseValues
            | Self::ChargingSchedulePeriodPhaseToUseACPhaseSwitchingUnsupported => "InvalidSchedule",
            Self::TxProfileMissingTransactionId => "MissingParam",
            Self::EvseDoesNotExist
            | Self::TxProfileEvseIdNotGreaterThanZero
            | Self::ChargingStationMaxProfileCannotBeRelative
            | Self::ChargingStationMaxProfileEvseIdGreaterThanZero
            | Self::RequestStartTransactionNonTxProfile => "InvalidValue",
        }
    }
}

impl fmt::Display for ProfileValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
