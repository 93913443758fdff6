//! Charging profile aggregate
//!
//! Contains the ChargingProfile entity, the validation vocabulary, the
//! protocol-facing request/response shapes and the persistence interface.

pub mod messages;
pub mod model;
pub mod repository;
pub mod validation;

pub use messages::{
    AddChargingProfileSource, ChargingProfileCriterion, ChargingProfileStatus,
    ClearChargingProfileCriteria, ClearChargingProfileResponse, ClearChargingProfileStatus,
    GetChargingProfilesRequest, ReportedChargingProfile, SetChargingProfileResponse, StatusInfo,
};
pub use model::{
    ChargingLimitSource, ChargingProfile, ChargingProfileKind, ChargingProfilePurpose,
    ChargingRateUnit, ChargingSchedule, ChargingSchedulePeriod, CompositeSchedule,
    CompositeScheduleDefaultLimits, RecurrencyKind, DEFAULT_AND_MAX_NUMBER_PHASES,
    STATION_WIDE_ID,
};
pub use repository::ProfilePersistence;
pub use validation::ProfileValidationResult;
