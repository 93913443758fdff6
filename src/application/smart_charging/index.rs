//! In-memory profile index
//!
//! Primary map keyed by profile id plus secondary indices by EVSE and by
//! `(evse, purpose, stack level)` slot. The indices are only touched through
//! `insert`/`remove`, so they cannot drift from the primary map.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::charging_profile::{ChargingProfilePurpose, ReportedChargingProfile};

/// Scope, purpose and stack level a profile occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileSlot {
    pub evse_id: i32,
    pub purpose: ChargingProfilePurpose,
    pub stack_level: i32,
}

impl ProfileSlot {
    pub fn of(record: &ReportedChargingProfile) -> Self {
        Self {
            evse_id: record.evse_id,
            purpose: record.profile.purpose,
            stack_level: record.profile.stack_level,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileIndex {
    by_id: BTreeMap<i32, ReportedChargingProfile>,
    by_evse: BTreeMap<i32, BTreeSet<i32>>,
    by_slot: HashMap<ProfileSlot, BTreeSet<i32>>,
}

impl ProfileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ReportedChargingProfile>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Insert `record`, replacing any profile with the same id regardless of
    /// the scope it was stored under. Returns the replaced record.
    pub fn insert(&mut self, record: ReportedChargingProfile) -> Option<ReportedChargingProfile> {
        let id = record.profile.id;
        let replaced = self.remove(id);

        self.by_evse.entry(record.evse_id).or_default().insert(id);
        self.by_slot.entry(ProfileSlot::of(&record)).or_default().insert(id);
        self.by_id.insert(id, record);

        replaced
    }

    pub fn remove(&mut self, profile_id: i32) -> Option<ReportedChargingProfile> {
        let record = self.by_id.remove(&profile_id)?;

        if let Some(ids) = self.by_evse.get_mut(&record.evse_id) {
            ids.remove(&profile_id);
            if ids.is_empty() {
                self.by_evse.remove(&record.evse_id);
            }
        }

        let slot = ProfileSlot::of(&record);
        if let Some(ids) = self.by_slot.get_mut(&slot) {
            ids.remove(&profile_id);
            if ids.is_empty() {
                self.by_slot.remove(&slot);
            }
        }

        Some(record)
    }

    pub fn get(&self, profile_id: i32) -> Option<&ReportedChargingProfile> {
        self.by_id.get(&profile_id)
    }

    /// All records ordered by profile id.
    pub fn iter(&self) -> impl Iterator<Item = &ReportedChargingProfile> {
        self.by_id.values()
    }

    /// Records stored under exactly `evse_id`.
    pub fn on_evse(&self, evse_id: i32) -> impl Iterator<Item = &ReportedChargingProfile> {
        self.by_evse
            .get(&evse_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
    }

    pub fn in_slot(&self, slot: ProfileSlot) -> impl Iterator<Item = &ReportedChargingProfile> {
        self.by_slot
            .get(&slot)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
    }

    /// Ids of records whose profile references `transaction_id`.
    pub fn ids_for_transaction(&self, transaction_id: &str) -> Vec<i32> {
        self.by_id
            .values()
            .filter(|r| r.profile.transaction_id.as_deref() == Some(transaction_id))
            .map(|r| r.profile.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
