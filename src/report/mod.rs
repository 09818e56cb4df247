//! Audit report staging and CSV output.
//!
//! Every decision the import side takes lands in one of these tables:
//! new and updated patients and transplants, per-field differences,
//! stored rows missing from the extract, and extract rows whose match
//! landed in the deleted partition. Tables are written as CSV files;
//! workbook styling lives with the downstream reporting tooling.

pub mod rows;
pub mod stage;

use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::model::LinkedPatient;

pub use rows::{
    DeletedPatientRow, MissingPatientRow, MissingTransplantRow, PatientFieldDifference,
    PatientRow, TransplantFieldDifference, TransplantRow,
};

/// Everything one run wants a human to look at afterwards
#[derive(Debug, Default)]
pub struct AuditReport {
    pub new_patients: Vec<PatientRow>,
    pub updated_patients: Vec<PatientRow>,
    pub patient_differences: Vec<PatientFieldDifference>,
    pub missing_patients: Vec<MissingPatientRow>,
    pub deleted_patients: Vec<DeletedPatientRow>,
    pub new_transplants: Vec<TransplantRow>,
    pub updated_transplants: Vec<TransplantRow>,
    pub transplant_differences: Vec<TransplantFieldDifference>,
    pub missing_transplants: Vec<MissingTransplantRow>,
    pub unchanged_patients: usize,
    pub unchanged_transplants: usize,
    pub integrity_errors: usize,
}

impl AuditReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write all non-empty tables as CSV files under `dir`
    pub fn write_csv(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        write_table(&dir.join("new_patients.csv"), &self.new_patients)?;
        write_table(&dir.join("updated_patients.csv"), &self.updated_patients)?;
        write_table(
            &dir.join("patient_field_differences.csv"),
            &self.patient_differences,
        )?;
        write_table(&dir.join("missing_patients.csv"), &self.missing_patients)?;
        write_table(&dir.join("deleted_patients.csv"), &self.deleted_patients)?;
        write_table(&dir.join("new_transplants.csv"), &self.new_transplants)?;
        write_table(&dir.join("updated_transplants.csv"), &self.updated_transplants)?;
        write_table(
            &dir.join("transplant_field_differences.csv"),
            &self.transplant_differences,
        )?;
        write_table(
            &dir.join("missing_transplants.csv"),
            &self.missing_transplants,
        )?;

        Ok(())
    }

    /// One-line-per-table summary at the end of the run
    pub fn log_summary(&self) {
        info!(
            "patients: {} new, {} updated, {} unchanged, {} missing, {} deleted hits",
            self.new_patients.len(),
            self.updated_patients.len(),
            self.unchanged_patients,
            self.missing_patients.len(),
            self.deleted_patients.len()
        );
        info!(
            "transplants: {} new, {} updated, {} unchanged, {} missing, {} integrity errors",
            self.new_transplants.len(),
            self.updated_transplants.len(),
            self.unchanged_transplants,
            self.missing_transplants.len(),
            self.integrity_errors
        );
    }
}

fn write_table<T: Serialize>(path: &Path, table: &[T]) -> Result<()> {
    if table.is_empty() {
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in table {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Matched-output column headers: the extract identity columns, the
/// matched registry columns and the transition code
const MATCHED_OUTPUT_COLUMNS: [&str; 18] = [
    "UKTR_ID",
    "UKTR_RR_ID",
    "MATCH_METHOD",
    "TRANSITION",
    "PREVIOUS_MATCH",
    "RR_ID",
    "UKTR_RSURNAME",
    "UKTR_RFORENAME",
    "UKTR_RDOB",
    "UKTR_RSEX",
    "UKTR_RPOSTCODE",
    "UKTR_RNHS_NO",
    "RR_SURNAME",
    "RR_FORENAME",
    "RR_DOB",
    "RR_SEX",
    "RR_POSTCODE",
    "RR_NHS_NO",
];

/// Write the matched-output table: one row per extract record with the
/// winning registry record alongside
pub fn write_matched_output(path: &Path, linked: &[LinkedPatient]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(MATCHED_OUTPUT_COLUMNS)?;

    for row in linked {
        let incoming = &row.incoming;
        let matched = row.matched.as_ref();

        writer.write_record([
            incoming.uktssa_no.to_string(),
            opt(incoming.prior_rr_no.map(|n| n.to_string())),
            opt(row.method.map(|method| method.as_str().to_string())),
            row.transition.as_str().to_string(),
            row.transition.legacy_code().to_string(),
            opt(matched.map(|p| p.rr_no.to_string())),
            opt(incoming.surname.clone()),
            opt(incoming.forename.clone()),
            opt(incoming.date_birth.map(|d| d.to_string())),
            opt(incoming.sex.clone()),
            opt(incoming.postcode.clone()),
            opt(incoming.nhs_no.map(|n| n.to_string())),
            opt(matched.and_then(|p| p.surname.clone())),
            opt(matched.and_then(|p| p.forename.clone())),
            opt(matched.and_then(|p| p.date_birth.map(|d| d.to_string()))),
            opt(matched.and_then(|p| p.sex.clone())),
            opt(matched.and_then(|p| p.postcode.clone())),
            opt(matched.and_then(|p| p.nhs_no.map(|n| n.to_string()))),
        ])?;
    }

    writer.flush()?;
    info!("wrote matched output for {} records to {}", linked.len(), path.display());
    Ok(())
}

fn opt(value: Option<String>) -> String {
    value.unwrap_or_default()
}
