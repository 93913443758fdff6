//! V201 SetChargingProfile handler
//!
//! Validates the submitted profile and stores it when accepted.
//! External constraints cannot be installed through this message.

use rust_ocpp::v2_0_1::messages::set_charging_profile::SetChargingProfileRequest;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{convert, INVALID_MESSAGE};
use crate::application::SmartChargingService;
use crate::domain::charging_profile::{
    AddChargingProfileSource, ChargingProfile, ChargingProfilePurpose, ChargingProfileStatus,
    SetChargingProfileResponse, StatusInfo,
};

fn rejected(reason_code: &str, additional_info: impl Into<String>) -> Value {
    let response = SetChargingProfileResponse {
        status: ChargingProfileStatus::Rejected,
        status_info: Some(StatusInfo::new(reason_code, additional_info)),
    };
    serde_json::to_value(response).unwrap_or_default()
}

pub fn handle_set_charging_profile(service: &SmartChargingService, payload: &Value) -> Value {
    let req: SetChargingProfileRequest = match serde_json::from_value(payload.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "V201: Failed to parse SetChargingProfile");
            return rejected(INVALID_MESSAGE, e.to_string());
        }
    };

    let profile: ChargingProfile = match convert(&req.charging_profile) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "V201: Unusable charging profile in SetChargingProfile");
            return rejected(INVALID_MESSAGE, e.to_string());
        }
    };

    info!(
        evse_id = req.evse_id,
        profile_id = profile.id,
        purpose = %profile.purpose,
        stack_level = profile.stack_level,
        "V201 SetChargingProfile"
    );

    if profile.purpose == ChargingProfilePurpose::ChargingStationExternalConstraints {
        warn!(profile_id = profile.id, "External constraints sent in SetChargingProfile");
        return rejected(
            "InvalidValue",
            "ChargingStationExternalConstraintsInSetChargingProfileRequest",
        );
    }

    match service.store().validate_and_add_profile(
        profile,
        req.evse_id,
        AddChargingProfileSource::SetChargingProfile,
    ) {
        Ok(response) => serde_json::to_value(response).unwrap_or_default(),
        Err(e) => {
            error!(evse_id = req.evse_id, error = %e, "Failed to persist charging profile");
            rejected("InternalError", e.to_string())
        }
    }
}
