//! JSON file profile persistence
//!
//! The whole record set is rewritten on every mutation using an atomic
//! temp file + rename, so a crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::domain::charging_profile::{
    ChargingLimitSource, ChargingProfile, ClearChargingProfileCriteria, ProfilePersistence,
    ReportedChargingProfile,
};
use crate::support::errors::{StorageError, StorageResult};

pub struct FileProfilePersistence {
    path: PathBuf,
    records: Mutex<BTreeMap<i32, ReportedChargingProfile>>,
}

impl FileProfilePersistence {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let records = read_records(&path)?;
        info!(path = %path.display(), profiles = records.len(), "Opened profile store file");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the records, write it out and only then
    /// make it current. Returns whatever `mutate` returned.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut BTreeMap<i32, ReportedChargingProfile>) -> T,
    ) -> StorageResult<T> {
        let mut records = self.records.lock();
        let mut next = records.clone();
        let outcome = mutate(&mut next);
        write_records(&self.path, &next)?;
        *records = next;
        Ok(outcome)
    }
}

impl ProfilePersistence for FileProfilePersistence {
    fn upsert(
        &self,
        evse_id: i32,
        profile: &ChargingProfile,
        source: ChargingLimitSource,
    ) -> StorageResult<()> {
        self.commit(|records| {
            records.insert(
                profile.id,
                ReportedChargingProfile {
                    evse_id,
                    profile: profile.clone(),
                    source,
                },
            );
        })
    }

    fn delete(&self, profile_id: i32) -> StorageResult<bool> {
        if !self.records.lock().contains_key(&profile_id) {
            return Ok(false);
        }
        self.commit(|records| records.remove(&profile_id).is_some())
    }

    fn delete_by(&self, criteria: &ClearChargingProfileCriteria) -> StorageResult<usize> {
        self.commit(|records| {
            let before = records.len();
            records.retain(|_, record| !criteria.matches(record.evse_id, &record.profile));
            before - records.len()
        })
    }

    fn delete_by_transaction(&self, transaction_id: &str) -> StorageResult<usize> {
        self.commit(|records| {
            let before = records.len();
            records.retain(|_, record| {
                record.profile.transaction_id.as_deref() != Some(transaction_id)
            });
            before - records.len()
        })
    }

    fn load_all(&self) -> StorageResult<Vec<ReportedChargingProfile>> {
        Ok(self.records.lock().values().cloned().collect())
    }
}

fn read_records(path: &Path) -> StorageResult<BTreeMap<i32, ReportedChargingProfile>> {
    if !path.exists() {
        debug!(path = %path.display(), "Profile store file not found, starting empty");
        return Ok(BTreeMap::new());
    }

    let contents = fs::read_to_string(path)?;
    let list: Vec<ReportedChargingProfile> = serde_json::from_str(&contents)?;

    let mut records = BTreeMap::new();
    for record in list {
        let id = record.profile.id;
        if records.insert(id, record).is_some() {
            return Err(StorageError::Corrupted(format!(
                "{} contains profile id {} more than once",
                path.display(),
                id
            )));
        }
    }
    Ok(records)
}

fn write_records(
    path: &Path,
    records: &BTreeMap<i32, ReportedChargingProfile>,
) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let list: Vec<&ReportedChargingProfile> = records.values().collect();
    let json = serde_json::to_string_pretty(&list)?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;

    debug!(path = %path.display(), profiles = records.len(), "Profile store file written");
    Ok(())
}
