//! Registry store query surface.
//!
//! The matching pipeline never talks to a database directly; it goes
//! through `RegistryStore`, and the candidate generators work from a
//! `RegistrySnapshot` read once at the start of the run so every stage
//! sees the same registry state.

pub mod memory;
pub mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::RegistrySnapshot;

use crate::error::Result;
use crate::identifier::IdentifierKind;
use crate::model::{RegistryPatient, StoredTransplant, UktPatient};

/// Which registry patient partition to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Live,
    Deleted,
}

/// Query and staging surface over the registry backend
///
/// Each call is atomic on its own; the pipeline does not assume any
/// cross-call transaction.
pub trait RegistryStore {
    /// All patients in one partition, in stable store order
    fn list_patients(&self, partition: Partition) -> Result<Vec<RegistryPatient>>;

    /// Patients holding a given national identifier
    fn lookup_by_national_id(
        &self,
        kind: IdentifierKind,
        value: i64,
    ) -> Result<Vec<RegistryPatient>>;

    /// Patient by registry id, preferring the live partition
    fn lookup_by_registry_id(&self, rr_no: i64) -> Result<Option<RegistryPatient>>;

    /// Current postcode for a patient, taken from the residency with
    /// the latest start date
    fn postcode_for(&self, rr_no: i64) -> Result<Option<String>>;

    /// Previously imported extract rows for an external id; more than
    /// one row signals an upstream integrity problem, so all rows are
    /// returned
    fn find_ukt_patients(&self, uktssa_no: i64) -> Result<Vec<UktPatient>>;

    fn insert_ukt_patient(&mut self, patient: UktPatient) -> Result<()>;

    fn update_ukt_patient(&mut self, patient: UktPatient) -> Result<()>;

    /// External ids of all previously imported extract rows
    fn list_ukt_patient_ids(&self) -> Result<Vec<i64>>;

    /// Stored transplant rows for a composite registration key; the
    /// key is meant to be unique, so more than one row is observable
    /// here as an integrity violation
    fn find_transplants(&self, registration_id: &str) -> Result<Vec<StoredTransplant>>;

    fn insert_transplant(&mut self, transplant: StoredTransplant) -> Result<()>;

    fn update_transplant(&mut self, transplant: StoredTransplant) -> Result<()>;

    /// Registration keys of all stored transplant rows
    fn list_registration_ids(&self) -> Result<Vec<String>>;
}
