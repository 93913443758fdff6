//! Smart charging use cases
//!
//! Validation, storage and composite schedule calculation of charging
//! profiles, tied together by `SmartChargingService`.

pub mod composite;
pub mod index;
pub mod schedule;
pub mod service;
pub mod store;
pub mod validator;

#[cfg(test)]
pub mod test_support;

pub use composite::CompositeScheduleCalculator;
pub use index::{ProfileIndex, ProfileSlot};
pub use schedule::{materialize, schedule_starts, PeriodEntry};
pub use service::{GetCompositeScheduleOutcome, SmartChargingService};
pub use store::ProfileStore;
pub use validator::ProfileValidator;
