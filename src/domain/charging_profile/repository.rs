//! Profile persistence interface

use super::messages::{ClearChargingProfileCriteria, ReportedChargingProfile};
use super::model::{ChargingLimitSource, ChargingProfile};
use crate::support::errors::StorageResult;

/// Durable store of `(evse_id, profile, source)` records keyed by profile id.
///
/// Calls are synchronous; the profile store serialises every mutation
/// behind its own lock, so implementations only need to be `Send + Sync`.
pub trait ProfilePersistence: Send + Sync {
    /// Insert or replace the record with `profile.id`, wherever it was stored.
    fn upsert(
        &self,
        evse_id: i32,
        profile: &ChargingProfile,
        source: ChargingLimitSource,
    ) -> StorageResult<()>;

    /// Remove a single profile. Returns whether it existed.
    fn delete(&self, profile_id: i32) -> StorageResult<bool>;

    /// Remove every record matching `criteria`. External constraints are
    /// never removed through this path. Returns the number removed.
    fn delete_by(&self, criteria: &ClearChargingProfileCriteria) -> StorageResult<usize>;

    /// Remove every record whose profile references `transaction_id`.
    fn delete_by_transaction(&self, transaction_id: &str) -> StorageResult<usize>;

    /// Every stored record, in no particular order.
    fn load_all(&self) -> StorageResult<Vec<ReportedChargingProfile>>;
}
