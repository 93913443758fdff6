//! OCPP 2.0.1 smart charging handlers
//!
//! Routes the smart charging actions a CSMS sends to the charging station.
//! Payloads are decoded into `rust_ocpp::v2_0_1` request types, converted
//! to domain types and answered with the response payload as JSON.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::application::SmartChargingService;

mod handle_clear_charging_profile;
mod handle_get_charging_profiles;
mod handle_get_composite_schedule;
mod handle_set_charging_profile;

pub use handle_clear_charging_profile::handle_clear_charging_profile;
pub use handle_get_charging_profiles::{handle_get_charging_profiles, GetChargingProfilesReply};
pub use handle_get_composite_schedule::handle_get_composite_schedule;
pub use handle_set_charging_profile::handle_set_charging_profile;

/// Reason code used when a request payload cannot be decoded.
pub const INVALID_MESSAGE: &str = "InvalidMessage";

/// Response to a smart charging Call, plus the Calls the station sends
/// afterwards as `(action, payload)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerReply {
    pub response: Value,
    pub follow_ups: Vec<(&'static str, Value)>,
}

impl HandlerReply {
    fn response(response: Value) -> Self {
        Self {
            response,
            follow_ups: Vec::new(),
        }
    }
}

/// Entry point for the smart charging part of an OCPP 2.0.1 station.
pub struct SmartChargingHandlerV201 {
    service: Arc<SmartChargingService>,
}

impl SmartChargingHandlerV201 {
    pub fn new(service: Arc<SmartChargingService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &SmartChargingService {
        &self.service
    }

    /// Handle `action` if it belongs to smart charging; `None` otherwise.
    pub fn handle(&self, action: &str, payload: &Value) -> Option<HandlerReply> {
        let reply = match action {
            "SetChargingProfile" => {
                HandlerReply::response(handle_set_charging_profile(&self.service, payload))
            }
            "ClearChargingProfile" => {
                HandlerReply::response(handle_clear_charging_profile(&self.service, payload))
            }
            "GetChargingProfiles" => {
                let reply = handle_get_charging_profiles(&self.service, payload);
                HandlerReply {
                    response: reply.response,
                    follow_ups: reply
                        .reports
                        .into_iter()
                        .map(|report| ("ReportChargingProfiles", report))
                        .collect(),
                }
            }
            "GetCompositeSchedule" => {
                HandlerReply::response(handle_get_composite_schedule(&self.service, payload))
            }
            other => {
                debug!(action = other, "Not a smart charging action");
                return None;
            }
        };

        info!(
            action,
            follow_ups = reply.follow_ups.len(),
            "V201 smart charging request handled"
        );
        Some(reply)
    }
}

/// Move a value between its `rust-ocpp` and domain representations, which
/// share the OCPP JSON field names.
pub(crate) fn convert<T: Serialize, D: DeserializeOwned>(value: &T) -> Result<D, serde_json::Error> {
    serde_json::from_value(serde_json::to_value(value)?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use crate::application::smart_charging::test_support::{device_model, transactions};
    use crate::application::SmartChargingService;
    use crate::domain::charging_profile::CompositeScheduleDefaultLimits;
    use crate::infrastructure::{InMemoryProfilePersistence, InMemoryTransactionContext};

    pub fn service() -> (Arc<SmartChargingService>, Arc<InMemoryTransactionContext>) {
        let transactions = transactions();
        let service = SmartChargingService::new(
            device_model(),
            transactions.clone(),
            Arc::new(InMemoryProfilePersistence::new()),
            CompositeScheduleDefaultLimits::default(),
        )
        .unwrap();
        (Arc::new(service), transactions)
    }
}
