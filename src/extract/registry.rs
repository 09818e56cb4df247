//! Registry patient CSV loaders for the offline CLI path.
//!
//! Live and deleted patients arrive as database exports with upper
//! case headers. Only the registry id column is mandatory; anything
//! else the export happens to omit simply loads as null.

use std::path::Path;

use csv::StringRecord;
use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::error::{LinkError, Result};
use crate::model::RegistryPatient;
use crate::parse;

/// Load a registry patient export into one partition
///
/// # Arguments
/// * `path` - CSV export with an `RR_NO` column
/// * `deleted` - Whether these rows belong to the deleted partition
pub fn load_registry(path: &Path, deleted: bool) -> Result<Vec<RegistryPatient>> {
    let mut reader = csv::Reader::from_path(path)?;

    let index: FxHashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(position, header)| (header.trim().to_uppercase(), position))
        .collect();

    if !index.contains_key("RR_NO") {
        return Err(LinkError::Schema(format!(
            "{} has no RR_NO column",
            path.display()
        )));
    }

    let cell = |record: &StringRecord, name: &str| -> Option<String> {
        let value = record.get(*index.get(name)?)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    };

    let mut patients = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;

        let Some(rr_no) = cell(&record, "RR_NO").as_deref().and_then(parse::parse_int)
        else {
            warn!(
                "{} line {}: missing or malformed RR_NO, row skipped",
                path.display(),
                line + 2
            );
            continue;
        };

        patients.push(RegistryPatient {
            rr_no,
            uktssa_no: cell(&record, "UKTSSA_NO").as_deref().and_then(parse::parse_int),
            surname: cell(&record, "SURNAME"),
            forename: cell(&record, "FORENAME"),
            date_birth: cell(&record, "DATE_BIRTH").as_deref().and_then(parse::parse_date),
            date_death: cell(&record, "DATE_DEATH").as_deref().and_then(parse::parse_date),
            sex: cell(&record, "SEX").as_deref().and_then(parse::parse_sex),
            nhs_no: cell(&record, "NEW_NHS_NO").as_deref().and_then(parse::parse_int),
            chi_no: cell(&record, "CHI_NO").as_deref().and_then(parse::parse_int),
            hsc_no: cell(&record, "HSC_NO").as_deref().and_then(parse::parse_int),
            postcode: cell(&record, "POST_CODE").as_deref().and_then(parse::format_postcode),
            deleted,
        });
    }

    info!(
        "loaded {} {} registry patients from {}",
        patients.len(),
        if deleted { "deleted" } else { "live" },
        path.display()
    );
    Ok(patients)
}
