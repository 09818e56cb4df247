//! In-memory registry store backing tests and the offline CLI.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::error::{LinkError, Result};
use crate::identifier::IdentifierKind;
use crate::model::{RegistryPatient, StoredTransplant, UktPatient};
use crate::store::{Partition, RegistryStore};

/// One residency spell, used to derive the current postcode
#[derive(Debug, Clone)]
pub struct Residency {
    pub date_start: NaiveDate,
    pub postcode: String,
}

/// Registry store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    patients: Vec<RegistryPatient>,
    residencies: FxHashMap<i64, Vec<Residency>>,
    ukt_patients: Vec<UktPatient>,
    transplants: Vec<StoredTransplant>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_patient(&mut self, patient: RegistryPatient) {
        self.patients.push(patient);
    }

    pub fn add_patients(&mut self, patients: impl IntoIterator<Item = RegistryPatient>) {
        self.patients.extend(patients);
    }

    pub fn add_residency(&mut self, rr_no: i64, date_start: NaiveDate, postcode: &str) {
        self.residencies.entry(rr_no).or_default().push(Residency {
            date_start,
            postcode: postcode.to_string(),
        });
    }

    pub fn add_ukt_patient(&mut self, patient: UktPatient) {
        self.ukt_patients.push(patient);
    }

    pub fn add_transplant(&mut self, transplant: StoredTransplant) {
        self.transplants.push(transplant);
    }
}

impl RegistryStore for MemoryStore {
    fn list_patients(&self, partition: Partition) -> Result<Vec<RegistryPatient>> {
        let deleted = matches!(partition, Partition::Deleted);
        Ok(self
            .patients
            .iter()
            .filter(|patient| patient.deleted == deleted)
            .cloned()
            .collect())
    }

    fn lookup_by_national_id(
        &self,
        kind: IdentifierKind,
        value: i64,
    ) -> Result<Vec<RegistryPatient>> {
        Ok(self
            .patients
            .iter()
            .filter(|patient| patient.national_id(kind) == Some(value))
            .cloned()
            .collect())
    }

    fn lookup_by_registry_id(&self, rr_no: i64) -> Result<Option<RegistryPatient>> {
        let mut hit: Option<&RegistryPatient> = None;
        for patient in &self.patients {
            if patient.rr_no == rr_no {
                match hit {
                    Some(existing) if !existing.deleted => {}
                    _ => hit = Some(patient),
                }
                if !patient.deleted {
                    break;
                }
            }
        }
        Ok(hit.cloned())
    }

    fn postcode_for(&self, rr_no: i64) -> Result<Option<String>> {
        Ok(self
            .residencies
            .get(&rr_no)
            .and_then(|spells| spells.iter().max_by_key(|spell| spell.date_start))
            .map(|spell| spell.postcode.clone()))
    }

    fn find_ukt_patients(&self, uktssa_no: i64) -> Result<Vec<UktPatient>> {
        Ok(self
            .ukt_patients
            .iter()
            .filter(|patient| patient.uktssa_no == uktssa_no)
            .cloned()
            .collect())
    }

    fn insert_ukt_patient(&mut self, patient: UktPatient) -> Result<()> {
        self.ukt_patients.push(patient);
        Ok(())
    }

    fn update_ukt_patient(&mut self, patient: UktPatient) -> Result<()> {
        let slot = self
            .ukt_patients
            .iter_mut()
            .find(|existing| existing.uktssa_no == patient.uktssa_no)
            .ok_or_else(|| {
                LinkError::Store(format!("no stored patient {} to update", patient.uktssa_no))
            })?;
        *slot = patient;
        Ok(())
    }

    fn list_ukt_patient_ids(&self) -> Result<Vec<i64>> {
        Ok(self
            .ukt_patients
            .iter()
            .map(|patient| patient.uktssa_no)
            .collect())
    }

    fn find_transplants(&self, registration_id: &str) -> Result<Vec<StoredTransplant>> {
        Ok(self
            .transplants
            .iter()
            .filter(|transplant| transplant.episode.registration_id == registration_id)
            .cloned()
            .collect())
    }

    fn insert_transplant(&mut self, transplant: StoredTransplant) -> Result<()> {
        self.transplants.push(transplant);
        Ok(())
    }

    fn update_transplant(&mut self, transplant: StoredTransplant) -> Result<()> {
        let key = transplant.episode.registration_id.clone();
        let slot = self
            .transplants
            .iter_mut()
            .find(|existing| existing.episode.registration_id == key)
            .ok_or_else(|| LinkError::Store(format!("no stored transplant {key} to update")))?;
        *slot = transplant;
        Ok(())
    }

    fn list_registration_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .transplants
            .iter()
            .map(|transplant| transplant.episode.registration_id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(rr_no: i64, deleted: bool) -> RegistryPatient {
        RegistryPatient {
            rr_no,
            uktssa_no: None,
            surname: None,
            forename: None,
            date_birth: None,
            date_death: None,
            sex: None,
            nhs_no: None,
            chi_no: None,
            hsc_no: None,
            postcode: None,
            deleted,
        }
    }

    #[test]
    fn registry_id_lookup_prefers_live_partition() {
        let mut store = MemoryStore::new();
        store.add_patient(patient(555, true));
        store.add_patient(patient(555, false));

        let hit = store.lookup_by_registry_id(555).unwrap().unwrap();
        assert!(!hit.deleted);
    }

    #[test]
    fn postcode_comes_from_latest_residency() {
        let mut store = MemoryStore::new();
        store.add_residency(1, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(), "BS10 5NB");
        store.add_residency(1, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(), "M1 1AE");
        store.add_residency(1, NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(), "SW1A 1AA");

        assert_eq!(store.postcode_for(1).unwrap().as_deref(), Some("M1 1AE"));
        assert_eq!(store.postcode_for(2).unwrap(), None);
    }

    #[test]
    fn update_of_missing_patient_is_a_store_error() {
        let mut store = MemoryStore::new();
        let row = UktPatient {
            uktssa_no: 42,
            rr_no: None,
            surname: None,
            forename: None,
            sex: None,
            postcode: None,
            date_birth: None,
            date_death: None,
            nhs_no: None,
            chi_no: None,
            hsc_no: None,
        };
        assert!(store.update_ukt_patient(row).is_err());
    }
}
