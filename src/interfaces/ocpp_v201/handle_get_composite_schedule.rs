//! V201 GetCompositeSchedule handler

use chrono::Utc;
use rust_ocpp::v2_0_1::enumerations::charging_rate_unit_enum_type::ChargingRateUnitEnumType;
use rust_ocpp::v2_0_1::messages::get_composite_schedule::GetCompositeScheduleRequest;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::INVALID_MESSAGE;
use crate::application::{GetCompositeScheduleOutcome, SmartChargingService};
use crate::domain::charging_profile::ChargingRateUnit;

pub fn handle_get_composite_schedule(service: &SmartChargingService, payload: &Value) -> Value {
    let req: GetCompositeScheduleRequest = match serde_json::from_value(payload.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "V201: Failed to parse GetCompositeSchedule");
            return json!({
                "status": "Rejected",
                "statusInfo": { "reasonCode": INVALID_MESSAGE, "additionalInfo": e.to_string() }
            });
        }
    };

    let unit = req.charging_rate_unit.map(|u| match u {
        ChargingRateUnitEnumType::A => ChargingRateUnit::A,
        ChargingRateUnitEnumType::W => ChargingRateUnit::W,
    });

    info!(
        evse_id = req.evse_id,
        duration = req.duration,
        unit = ?unit,
        "V201 GetCompositeSchedule"
    );

    match service.get_composite_schedule(req.evse_id, Utc::now(), req.duration, unit) {
        GetCompositeScheduleOutcome::Accepted(schedule) => json!({
            "status": "Accepted",
            "schedule": schedule,
        }),
        GetCompositeScheduleOutcome::Rejected(status_info) => json!({
            "status": "Rejected",
            "statusInfo": status_info,
        }),
    }
}
