pub mod ocpp_v201;

pub use ocpp_v201::{HandlerReply, SmartChargingHandlerV201};
