//! # OCPP Smart Charging
//!
//! OCPP 2.0.1 smart charging core for a charging station: validates and
//! stores charging profiles and resolves them into composite schedules.
//!
//! ## Architecture
//!
//! - **domain**: Charging profile entities, validation vocabulary and ports
//! - **application**: Validator, profile store, composite schedule calculator
//! - **infrastructure**: Profile persistence, device model, transaction context
//! - **interfaces**: OCPP 2.0.1 message handlers
//! - **support**: Errors, tracing setup and time helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod support;

pub use config::{default_config_path, AppConfig};

pub use application::{GetCompositeScheduleOutcome, SmartChargingService};
pub use interfaces::SmartChargingHandlerV201;
pub use support::errors::{ConfigError, StorageError, StorageResult};
pub use support::telemetry::init_tracing;
