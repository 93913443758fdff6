//! V201 GetChargingProfiles handler
//!
//! Answers with `Accepted` or `NoProfiles` and prepares the
//! ReportChargingProfiles messages carrying the matching profiles, one per
//! EVSE and charging limit source.

use rust_ocpp::v2_0_1::messages::get_charging_profiles::GetChargingProfilesRequest as GetChargingProfilesCall;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{convert, INVALID_MESSAGE};
use crate::application::SmartChargingService;
use crate::domain::charging_profile::{
    ChargingLimitSource, ChargingProfile, GetChargingProfilesRequest,
};

#[derive(Debug, Clone, PartialEq)]
pub struct GetChargingProfilesReply {
    pub response: Value,
    /// ReportChargingProfiles payloads, in sending order.
    pub reports: Vec<Value>,
}

fn reply(status: &str, reason: Option<(&str, String)>) -> GetChargingProfilesReply {
    let mut response = json!({ "status": status });
    if let Some((reason_code, additional_info)) = reason {
        response["statusInfo"] = json!({
            "reasonCode": reason_code,
            "additionalInfo": additional_info,
        });
    }
    GetChargingProfilesReply {
        response,
        reports: Vec::new(),
    }
}

pub fn handle_get_charging_profiles(
    service: &SmartChargingService,
    payload: &Value,
) -> GetChargingProfilesReply {
    let call: GetChargingProfilesCall = match serde_json::from_value(payload.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "V201: Failed to parse GetChargingProfiles");
            return reply("Rejected", Some((INVALID_MESSAGE, e.to_string())));
        }
    };
    let req: GetChargingProfilesRequest = match convert(&call) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "V201: Unusable GetChargingProfiles criteria");
            return reply("Rejected", Some((INVALID_MESSAGE, e.to_string())));
        }
    };

    let reported = service.store().get_reported_profiles(&req);
    info!(
        request_id = req.request_id,
        evse_id = ?req.evse_id,
        profiles = reported.len(),
        "V201 GetChargingProfiles"
    );
    if reported.is_empty() {
        return reply("NoProfiles", None);
    }

    let mut groups: Vec<((i32, ChargingLimitSource), Vec<ChargingProfile>)> = Vec::new();
    for record in reported {
        let key = (record.evse_id, record.source);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, profiles)) => profiles.push(record.profile),
            None => groups.push((key, vec![record.profile])),
        }
    }

    let last = groups.len() - 1;
    let reports = groups
        .into_iter()
        .enumerate()
        .map(|(i, ((evse_id, source), profiles))| {
            json!({
                "requestId": req.request_id,
                "chargingLimitSource": source,
                "evseId": evse_id,
                "chargingProfile": profiles,
                "tbc": i != last,
            })
        })
        .collect();

    GetChargingProfilesReply {
        response: json!({ "status": "Accepted" }),
        reports,
    }
}
