//! Profile store
//!
//! Single owner of the accepted profiles. Every mutation takes the write
//! lock for the whole validate, persist, index sequence; readers share the
//! read lock and always see a consistent index. Persistence is written
//! before the index so a failed write leaves the store unchanged.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::index::ProfileIndex;
use super::validator::ProfileValidator;
use crate::domain::charging_profile::{
    AddChargingProfileSource, ChargingLimitSource, ChargingProfile, ClearChargingProfileCriteria,
    ClearChargingProfileResponse, GetChargingProfilesRequest, ProfilePersistence,
    ReportedChargingProfile, SetChargingProfileResponse, STATION_WIDE_ID,
};
use crate::support::errors::StorageResult;

pub struct ProfileStore {
    index: RwLock<ProfileIndex>,
    persistence: Arc<dyn ProfilePersistence>,
    validator: ProfileValidator,
}

impl ProfileStore {
    /// Build the store from whatever `persistence` already holds.
    pub fn load(
        validator: ProfileValidator,
        persistence: Arc<dyn ProfilePersistence>,
    ) -> StorageResult<Self> {
        let records = persistence.load_all()?;
        let index = ProfileIndex::from_records(records);
        info!(profiles = index.len(), "Charging profiles loaded");
        Ok(Self {
            index: RwLock::new(index),
            persistence,
            validator,
        })
    }

    pub fn validator(&self) -> &ProfileValidator {
        &self.validator
    }

    // ── Mutations ──────────────────────────────────────────────

    /// Store `profile` under `evse_id` without validating it, replacing any
    /// profile with the same id wherever it lives.
    pub fn add_profile(
        &self,
        profile: ChargingProfile,
        evse_id: i32,
    ) -> StorageResult<SetChargingProfileResponse> {
        self.add_profile_with_source(profile, evse_id, ChargingLimitSource::default())
    }

    pub fn add_profile_with_source(
        &self,
        profile: ChargingProfile,
        evse_id: i32,
        source: ChargingLimitSource,
    ) -> StorageResult<SetChargingProfileResponse> {
        let mut index = self.index.write();
        self.insert(&mut index, profile, evse_id, source)?;
        Ok(SetChargingProfileResponse::accepted())
    }

    /// Validate `profile` and store it when valid. Rejections are returned
    /// as a `Rejected` response and leave the store untouched.
    pub fn validate_and_add_profile(
        &self,
        profile: ChargingProfile,
        evse_id: i32,
        source: AddChargingProfileSource,
    ) -> StorageResult<SetChargingProfileResponse> {
        self.validate_and_add_profile_with_limit_source(
            profile,
            evse_id,
            source,
            ChargingLimitSource::default(),
        )
    }

    pub fn validate_and_add_profile_with_limit_source(
        &self,
        profile: ChargingProfile,
        evse_id: i32,
        source: AddChargingProfileSource,
        limit_source: ChargingLimitSource,
    ) -> StorageResult<SetChargingProfileResponse> {
        let mut index = self.index.write();

        let result = self.validator.validate(&profile, evse_id, source, &index);
        if !result.is_valid() {
            info!(
                profile_id = profile.id,
                evse_id,
                purpose = %profile.purpose,
                result = %result,
                "Charging profile rejected"
            );
            metrics::counter!("smart_charging_profiles_total", "result" => "rejected").increment(1);
            metrics::counter!("smart_charging_profile_rejections_total", "reason" => result.as_str())
                .increment(1);
            return Ok(SetChargingProfileResponse::rejected(result));
        }

        let profile = self.validator.normalize(profile, evse_id);
        self.insert(&mut index, profile, evse_id, limit_source)?;
        metrics::counter!("smart_charging_profiles_total", "result" => "accepted").increment(1);
        Ok(SetChargingProfileResponse::accepted())
    }

    fn insert(
        &self,
        index: &mut ProfileIndex,
        profile: ChargingProfile,
        evse_id: i32,
        source: ChargingLimitSource,
    ) -> StorageResult<()> {
        self.persistence.upsert(evse_id, &profile, source)?;

        let profile_id = profile.id;
        let purpose = profile.purpose;
        let replaced = index.insert(ReportedChargingProfile {
            evse_id,
            profile,
            source,
        });
        info!(
            profile_id,
            evse_id,
            %purpose,
            replaced_evse_id = replaced.map(|r| r.evse_id),
            "Charging profile stored"
        );
        Ok(())
    }

    /// Remove the profile with `profile_id` if given, otherwise every
    /// profile matching `criteria` (all of them when `None`). External
    /// constraints are only removable by id.
    pub fn clear_profiles(
        &self,
        profile_id: Option<i32>,
        criteria: Option<&ClearChargingProfileCriteria>,
    ) -> StorageResult<ClearChargingProfileResponse> {
        let mut index = self.index.write();

        if let Some(profile_id) = profile_id {
            if index.get(profile_id).is_none() {
                debug!(profile_id, "No charging profile to clear");
                return Ok(ClearChargingProfileResponse::unknown());
            }
            self.persistence.delete(profile_id)?;
            index.remove(profile_id);
            info!(profile_id, "Charging profile cleared");
            return Ok(ClearChargingProfileResponse::accepted());
        }

        let criteria = criteria.cloned().unwrap_or_default();
        let matching: Vec<i32> = index
            .iter()
            .filter(|record| criteria.matches(record.evse_id, &record.profile))
            .map(|record| record.profile.id)
            .collect();
        if matching.is_empty() {
            debug!(?criteria, "No charging profiles match clear criteria");
            return Ok(ClearChargingProfileResponse::unknown());
        }

        self.persistence.delete_by(&criteria)?;
        for profile_id in &matching {
            index.remove(*profile_id);
        }
        info!(?criteria, cleared = matching.len(), "Charging profiles cleared");
        Ok(ClearChargingProfileResponse::accepted())
    }

    /// Drop every profile bound to `transaction_id`, in any scope.
    pub fn delete_transaction_tx_profiles(&self, transaction_id: &str) -> StorageResult<usize> {
        let mut index = self.index.write();

        let matching = index.ids_for_transaction(transaction_id);
        if matching.is_empty() {
            return Ok(0);
        }

        self.persistence.delete_by_transaction(transaction_id)?;
        for profile_id in &matching {
            index.remove(*profile_id);
        }
        info!(transaction_id, removed = matching.len(), "Transaction profiles removed");
        Ok(matching.len())
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn get_profiles(&self) -> Vec<ReportedChargingProfile> {
        self.index.read().iter().cloned().collect()
    }

    /// Profiles stored under exactly `evse_id`.
    pub fn get_profiles_on_evse(&self, evse_id: i32) -> Vec<ChargingProfile> {
        self.index
            .read()
            .on_evse(evse_id)
            .map(|record| record.profile.clone())
            .collect()
    }

    /// Profiles that currently apply to `evse_id`: its own first, then the
    /// station-wide ones, each re-checked against the current device model
    /// and transaction state.
    pub fn get_valid_profiles(&self, evse_id: i32) -> Vec<ChargingProfile> {
        let index = self.index.read();

        let station_wide = (evse_id != STATION_WIDE_ID)
            .then(|| index.on_evse(STATION_WIDE_ID))
            .into_iter()
            .flatten();

        let mut seen = HashSet::new();
        index
            .on_evse(evse_id)
            .chain(station_wide)
            .filter(|record| seen.insert(record.profile.id))
            .filter(|record| {
                let result = self.validator.revalidate(record, &index);
                if !result.is_valid() {
                    debug!(
                        profile_id = record.profile.id,
                        evse_id = record.evse_id,
                        result = %result,
                        "Stored profile no longer applies"
                    );
                }
                result.is_valid()
            })
            .map(|record| record.profile.clone())
            .collect()
    }

    /// Stored profiles selected by a GetChargingProfiles request.
    pub fn get_reported_profiles(
        &self,
        request: &GetChargingProfilesRequest,
    ) -> Vec<ReportedChargingProfile> {
        self.index
            .read()
            .iter()
            .filter(|record| request.evse_id.map_or(true, |evse_id| evse_id == record.evse_id))
            .filter(|record| request.criteria.matches(record))
            .cloned()
            .collect()
    }
}
