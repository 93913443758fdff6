//! Request and response shapes exchanged with the protocol layer

use serde::{Deserialize, Serialize};

use super::model::{ChargingLimitSource, ChargingProfile, ChargingProfilePurpose};
use super::validation::ProfileValidationResult;

/// Where a profile submission originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddChargingProfileSource {
    #[default]
    SetChargingProfile,
    /// The profile arrived inside a RequestStartTransaction, before the
    /// transaction it applies to exists.
    RequestStartTransactionRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingProfileStatus {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub reason_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl StatusInfo {
    pub fn new(reason_code: impl Into<String>, additional_info: impl Into<String>) -> Self {
        Self {
            reason_code: reason_code.into(),
            additional_info: Some(additional_info.into()),
        }
    }

    /// Reason code and variant name of a validation outcome.
    pub fn from_result(result: ProfileValidationResult) -> Self {
        Self::new(result.reason_code(), result.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChargingProfileResponse {
    pub status: ChargingProfileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
}

impl SetChargingProfileResponse {
    pub fn accepted() -> Self {
        Self {
            status: ChargingProfileStatus::Accepted,
            status_info: None,
        }
    }

    /// Rejection carrying the reason code and name of `result`.
    pub fn rejected(result: ProfileValidationResult) -> Self {
        Self {
            status: ChargingProfileStatus::Rejected,
            status_info: Some(StatusInfo::from_result(result)),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ChargingProfileStatus::Accepted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearChargingProfileStatus {
    Accepted,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearChargingProfileResponse {
    pub status: ClearChargingProfileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
}

impl ClearChargingProfileResponse {
    pub fn accepted() -> Self {
        Self {
            status: ClearChargingProfileStatus::Accepted,
            status_info: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: ClearChargingProfileStatus::Unknown,
            status_info: None,
        }
    }
}

/// Filter for criteria-based clearing. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearChargingProfileCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_id: Option<i32>,
    #[serde(
        rename = "chargingProfilePurpose",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub purpose: Option<ChargingProfilePurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_level: Option<i32>,
}

impl ClearChargingProfileCriteria {
    /// External constraints never match: they can only be cleared by id.
    pub fn matches(&self, evse_id: i32, profile: &ChargingProfile) -> bool {
        profile.purpose != ChargingProfilePurpose::ChargingStationExternalConstraints
            && self.evse_id.map_or(true, |id| id == evse_id)
            && self.purpose.map_or(true, |purpose| purpose == profile.purpose)
            && self.stack_level.map_or(true, |level| level == profile.stack_level)
    }
}

/// Selection criteria of a GetChargingProfiles request, AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfileCriterion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_profile_purpose: Option<ChargingProfilePurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_profile_id: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_limit_source: Option<Vec<ChargingLimitSource>>,
}

impl ChargingProfileCriterion {
    pub fn matches(&self, reported: &ReportedChargingProfile) -> bool {
        let profile = &reported.profile;
        self.charging_profile_purpose
            .map_or(true, |purpose| purpose == profile.purpose)
            && self.stack_level.map_or(true, |level| level == profile.stack_level)
            && self
                .charging_profile_id
                .as_ref()
                .map_or(true, |ids| ids.contains(&profile.id))
            && self
                .charging_limit_source
                .as_ref()
                .map_or(true, |sources| sources.contains(&reported.source))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChargingProfilesRequest {
    #[serde(default)]
    pub request_id: i32,
    /// `None` selects every scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_id: Option<i32>,
    #[serde(rename = "chargingProfile", default)]
    pub criteria: ChargingProfileCriterion,
}

/// A stored profile together with its scope and limit source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedChargingProfile {
    pub evse_id: i32,
    pub profile: ChargingProfile,
    #[serde(default)]
    pub source: ChargingLimitSource,
}
