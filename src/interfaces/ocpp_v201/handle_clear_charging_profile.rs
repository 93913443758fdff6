//! V201 ClearChargingProfile handler

use rust_ocpp::v2_0_1::messages::clear_charging_profile::ClearChargingProfileRequest;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{convert, INVALID_MESSAGE};
use crate::application::SmartChargingService;
use crate::domain::charging_profile::{
    ChargingProfilePurpose, ClearChargingProfileCriteria, ClearChargingProfileResponse,
    ClearChargingProfileStatus, StatusInfo,
};

fn unknown(reason_code: &str, additional_info: impl Into<String>) -> Value {
    let response = ClearChargingProfileResponse {
        status: ClearChargingProfileStatus::Unknown,
        status_info: Some(StatusInfo::new(reason_code, additional_info)),
    };
    serde_json::to_value(response).unwrap_or_default()
}

pub fn handle_clear_charging_profile(service: &SmartChargingService, payload: &Value) -> Value {
    let req: ClearChargingProfileRequest = match serde_json::from_value(payload.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "V201: Failed to parse ClearChargingProfile");
            return unknown(INVALID_MESSAGE, e.to_string());
        }
    };

    let criteria: Option<ClearChargingProfileCriteria> =
        match req.charging_profile_criteria.as_ref().map(convert).transpose() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "V201: Unusable ClearChargingProfile criteria");
                return unknown(INVALID_MESSAGE, e.to_string());
            }
        };

    info!(
        profile_id = ?req.charging_profile_id,
        ?criteria,
        "V201 ClearChargingProfile"
    );

    if criteria
        .as_ref()
        .and_then(|c| c.purpose)
        .is_some_and(|p| p == ChargingProfilePurpose::ChargingStationExternalConstraints)
    {
        return unknown(
            "InvalidValue",
            "ChargingStationExternalConstraintsInClearChargingProfileRequest",
        );
    }

    match service
        .store()
        .clear_profiles(req.charging_profile_id, criteria.as_ref())
    {
        Ok(response) => serde_json::to_value(response).unwrap_or_default(),
        Err(e) => {
            error!(error = %e, "Failed to clear charging profiles");
            unknown("InternalError", e.to_string())
        }
    }
}
