pub mod smart_charging;

pub use smart_charging::{
    CompositeScheduleCalculator, GetCompositeScheduleOutcome, ProfileStore, ProfileValidator,
    SmartChargingService,
};
