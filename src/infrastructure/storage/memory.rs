//! In-memory profile persistence

use dashmap::DashMap;

use crate::domain::charging_profile::{
    ChargingLimitSource, ChargingProfile, ClearChargingProfileCriteria, ProfilePersistence,
    ReportedChargingProfile,
};
use crate::support::errors::StorageResult;

/// Volatile persistence for development and testing
#[derive(Default)]
pub struct InMemoryProfilePersistence {
    profiles: DashMap<i32, ReportedChargingProfile>,
}

impl InMemoryProfilePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with records, as if they had been persisted earlier.
    pub fn with_records(records: impl IntoIterator<Item = ReportedChargingProfile>) -> Self {
        let storage = Self::new();
        for record in records {
            storage.profiles.insert(record.profile.id, record);
        }
        storage
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfilePersistence for InMemoryProfilePersistence {
    fn upsert(
        &self,
        evse_id: i32,
        profile: &ChargingProfile,
        source: ChargingLimitSource,
    ) -> StorageResult<()> {
        self.profiles.insert(
            profile.id,
            ReportedChargingProfile {
                evse_id,
                profile: profile.clone(),
                source,
            },
        );
        Ok(())
    }

    fn delete(&self, profile_id: i32) -> StorageResult<bool> {
        Ok(self.profiles.remove(&profile_id).is_some())
    }

    fn delete_by(&self, criteria: &ClearChargingProfileCriteria) -> StorageResult<usize> {
        let before = self.profiles.len();
        self.profiles
            .retain(|_, record| !criteria.matches(record.evse_id, &record.profile));
        Ok(before - self.profiles.len())
    }

    fn delete_by_transaction(&self, transaction_id: &str) -> StorageResult<usize> {
        let before = self.profiles.len();
        self.profiles
            .retain(|_, record| record.profile.transaction_id.as_deref() != Some(transaction_id));
        Ok(before - self.profiles.len())
    }

    fn load_all(&self) -> StorageResult<Vec<ReportedChargingProfile>> {
        Ok(self.profiles.iter().map(|entry| entry.value().clone()).collect())
    }
}
