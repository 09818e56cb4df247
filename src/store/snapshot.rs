//! Stable registry snapshot read once per run.

use log::info;

use crate::error::Result;
use crate::model::RegistryPatient;
use crate::store::{Partition, RegistryStore};

/// Both registry partitions read into memory, live rows first, with
/// postcodes joined from the residency data
///
/// The whole run works from one snapshot so every matching stage sees
/// the same registry state. Live rows preceding deleted rows also
/// means a live candidate is always seen before a deleted candidate
/// for the same patient.
#[derive(Debug)]
pub struct RegistrySnapshot {
    patients: Vec<RegistryPatient>,
    live_len: usize,
}

impl RegistrySnapshot {
    /// Read both partitions from a store
    pub fn load(store: &impl RegistryStore) -> Result<Self> {
        let mut live = store.list_patients(Partition::Live)?;
        let mut deleted = store.list_patients(Partition::Deleted)?;

        for patient in live.iter_mut().chain(deleted.iter_mut()) {
            if patient.postcode.is_none() {
                patient.postcode = store.postcode_for(patient.rr_no)?;
            }
        }

        info!(
            "registry snapshot: {} live, {} deleted",
            live.len(),
            deleted.len()
        );

        Ok(Self::from_partitions(live, deleted))
    }

    /// Build a snapshot from already-loaded partitions
    #[must_use]
    pub fn from_partitions(live: Vec<RegistryPatient>, deleted: Vec<RegistryPatient>) -> Self {
        let live_len = live.len();
        let mut patients = live;
        patients.extend(deleted);

        // Normalise the flag to the partition each row arrived in
        for (index, patient) in patients.iter_mut().enumerate() {
            patient.deleted = index >= live_len;
        }

        Self { patients, live_len }
    }

    /// All patients, live partition first
    #[must_use]
    pub fn patients(&self) -> &[RegistryPatient] {
        &self.patients
    }

    /// Patient by snapshot index
    #[must_use]
    pub fn patient(&self, index: usize) -> &RegistryPatient {
        &self.patients[index]
    }

    /// Whether a snapshot index points into the deleted partition
    #[must_use]
    pub const fn is_deleted(&self, index: usize) -> bool {
        index >= self.live_len
    }

    #[must_use]
    pub fn live(&self) -> &[RegistryPatient] {
        &self.patients[..self.live_len]
    }

    #[must_use]
    pub fn deleted(&self) -> &[RegistryPatient] {
        &self.patients[self.live_len..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}
