pub mod charging_profile;
pub mod ports;

// Re-export commonly used types
pub use charging_profile::{
    ChargingProfile, ChargingProfilePurpose, ChargingRateUnit, CompositeSchedule,
    ProfilePersistence, ProfileValidationResult,
};
pub use ports::{ActiveTransaction, ConfigurationProvider, CurrentPhaseType, TransactionContext};
