//! Typed audit table rows.
//!
//! Column headers follow the audit workbooks the downstream team
//! already consumes, so the CSV output drops straight into their
//! existing review process.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{RegistryPatient, TransplantEpisode, UktPatient};

/// One row of the patient match table (new and updated patients)
#[derive(Debug, Clone, Serialize)]
pub struct PatientRow {
    #[serde(rename = "UKTSSA_No")]
    pub uktssa_no: i64,
    #[serde(rename = "Match Type")]
    pub match_type: String,
    #[serde(rename = "File RR_No")]
    pub file_rr_no: Option<i64>,
    #[serde(rename = "File Surname")]
    pub file_surname: Option<String>,
    #[serde(rename = "File Forename")]
    pub file_forename: Option<String>,
    #[serde(rename = "File Sex")]
    pub file_sex: Option<String>,
    #[serde(rename = "File Date Birth")]
    pub file_date_birth: Option<NaiveDate>,
    #[serde(rename = "File NHS Number")]
    pub file_nhs_no: Option<i64>,
    #[serde(rename = "DB RR_No")]
    pub db_rr_no: Option<i64>,
    #[serde(rename = "DB Surname")]
    pub db_surname: Option<String>,
    #[serde(rename = "DB Forename")]
    pub db_forename: Option<String>,
    #[serde(rename = "DB Sex")]
    pub db_sex: Option<String>,
    #[serde(rename = "DB Date Birth")]
    pub db_date_birth: Option<NaiveDate>,
    #[serde(rename = "DB NHS Number")]
    pub db_nhs_no: Option<i64>,
}

impl PatientRow {
    #[must_use]
    pub fn new(match_type: &str, file: &UktPatient, db: Option<&UktPatient>) -> Self {
        Self {
            uktssa_no: file.uktssa_no,
            match_type: match_type.to_string(),
            file_rr_no: file.rr_no,
            file_surname: file.surname.clone(),
            file_forename: file.forename.clone(),
            file_sex: file.sex.clone(),
            file_date_birth: file.date_birth,
            file_nhs_no: file.nhs_no,
            db_rr_no: db.and_then(|p| p.rr_no),
            db_surname: db.and_then(|p| p.surname.clone()),
            db_forename: db.and_then(|p| p.forename.clone()),
            db_sex: db.and_then(|p| p.sex.clone()),
            db_date_birth: db.and_then(|p| p.date_birth),
            db_nhs_no: db.and_then(|p| p.nhs_no),
        }
    }
}

/// One per-field difference between the file and the previous import
#[derive(Debug, Clone, Serialize)]
pub struct PatientFieldDifference {
    #[serde(rename = "UKTSSA_No")]
    pub uktssa_no: i64,
    #[serde(rename = "Field")]
    pub field: &'static str,
    #[serde(rename = "File Value")]
    pub file_value: String,
    #[serde(rename = "Previous Import Value")]
    pub previous_value: String,
}

/// One per-field difference on a stored transplant row
#[derive(Debug, Clone, Serialize)]
pub struct TransplantFieldDifference {
    #[serde(rename = "UKTSSA_No")]
    pub uktssa_no: i64,
    #[serde(rename = "Transplant_ID")]
    pub registration_id: String,
    #[serde(rename = "Field")]
    pub field: &'static str,
    #[serde(rename = "File Value")]
    pub file_value: String,
    #[serde(rename = "Previous Import Value")]
    pub previous_value: String,
}

/// One row of the transplant match table (new and updated transplants)
#[derive(Debug, Clone, Serialize)]
pub struct TransplantRow {
    #[serde(rename = "Match Type")]
    pub match_type: String,
    #[serde(rename = "UKTSSA_No")]
    pub uktssa_no: i64,
    #[serde(rename = "Transplant_ID")]
    pub registration_id: String,
    #[serde(rename = "RR_No")]
    pub rr_no: Option<i64>,
    #[serde(rename = "Transplant Date")]
    pub transplant_date: Option<NaiveDate>,
    #[serde(rename = "Transplant Unit")]
    pub transplant_unit: Option<String>,
    #[serde(rename = "Registration Date")]
    pub registration_date: NaiveDate,
}

impl TransplantRow {
    #[must_use]
    pub fn new(match_type: &str, episode: &TransplantEpisode, rr_no: Option<i64>) -> Self {
        Self {
            match_type: match_type.to_string(),
            uktssa_no: episode.uktssa_no,
            registration_id: episode.registration_id.clone(),
            rr_no,
            transplant_date: episode.transplant_date,
            transplant_unit: episode.transplant_unit.clone(),
            registration_date: episode.registration_date,
        }
    }
}

/// Stored patient absent from this extract
#[derive(Debug, Clone, Serialize)]
pub struct MissingPatientRow {
    #[serde(rename = "UKTSSA_No")]
    pub uktssa_no: i64,
}

/// Stored transplant absent from this extract
#[derive(Debug, Clone, Serialize)]
pub struct MissingTransplantRow {
    #[serde(rename = "Transplant_ID")]
    pub registration_id: String,
}

/// Extract row whose match landed in the deleted partition
#[derive(Debug, Clone, Serialize)]
pub struct DeletedPatientRow {
    #[serde(rename = "UKTSSA_No")]
    pub uktssa_no: i64,
    #[serde(rename = "RR_No")]
    pub rr_no: i64,
    #[serde(rename = "Surname")]
    pub surname: Option<String>,
    #[serde(rename = "Forename")]
    pub forename: Option<String>,
}

impl DeletedPatientRow {
    #[must_use]
    pub fn new(uktssa_no: i64, registry: &RegistryPatient) -> Self {
        Self {
            uktssa_no,
            rr_no: registry.rr_no,
            surname: registry.surname.clone(),
            forename: registry.forename.clone(),
        }
    }
}

/// Render a patient field for the difference tables
#[must_use]
pub fn patient_field_value(patient: &UktPatient, field: &str) -> String {
    match field {
        "surname" => opt_str(&patient.surname),
        "forename" => opt_str(&patient.forename),
        "sex" => opt_str(&patient.sex),
        "postcode" => opt_str(&patient.postcode),
        "date_birth" => opt_date(patient.date_birth),
        "date_death" => opt_date(patient.date_death),
        "nhs_no" => opt_int(patient.nhs_no),
        "chi_no" => opt_int(patient.chi_no),
        "hsc_no" => opt_int(patient.hsc_no),
        _ => String::new(),
    }
}

/// Render a transplant field for the difference tables
#[must_use]
pub fn transplant_field_value(episode: &TransplantEpisode, field: &str) -> String {
    match field {
        "transplant_id" => opt_int(episode.transplant_id),
        "transplant_date" => opt_date(episode.transplant_date),
        "transplant_type" => opt_str(&episode.transplant_type),
        "transplant_organ" => opt_str(&episode.transplant_organ),
        "transplant_unit" => opt_str(&episode.transplant_unit),
        "registration_date" => episode.registration_date.to_string(),
        "registration_date_type" => opt_str(&episode.registration_date_type),
        "registration_end_date" => opt_date(episode.registration_end_date),
        "registration_end_status" => opt_str(&episode.registration_end_status),
        "transplant_consideration" => opt_str(&episode.transplant_consideration),
        "transplant_dialysis" => opt_str(&episode.transplant_dialysis),
        "transplant_relationship" => opt_str(&episode.transplant_relationship),
        "transplant_sex" => opt_str(&episode.transplant_sex),
        "cause_of_failure" => opt_str(&episode.cause_of_failure),
        "cause_of_failure_text" => opt_str(&episode.cause_of_failure_text),
        "cit_mins" => opt_str(&episode.cit_mins),
        "hla_mismatch" => opt_str(&episode.hla_mismatch),
        "ukt_fail_date" => opt_date(episode.ukt_fail_date),
        "ukt_suspension" => episode
            .ukt_suspension
            .map(|flag| flag.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_date(value: Option<NaiveDate>) -> String {
    value.map(|date| date.to_string()).unwrap_or_default()
}

fn opt_int(value: Option<i64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}
