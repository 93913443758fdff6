//! Infrastructure layer - adapters for the smart charging ports

pub mod device_model;
pub mod storage;
pub mod transactions;

pub use device_model::StaticDeviceModel;
pub use storage::{FileProfilePersistence, InMemoryProfilePersistence};
pub use transactions::InMemoryTransactionContext;
