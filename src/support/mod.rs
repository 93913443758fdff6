pub mod errors;
pub mod telemetry;
pub mod time;
