//! Input file loaders.
//!
//! The UKTR extract loader verifies the column layout up front, then
//! parses row by row: a malformed external id skips the row (counted
//! separately from unmatched rows), every other bad cell degrades to
//! a null field. Cells are scrubbed of NUL bytes and other non-ASCII
//! residue before parsing; the files pass through enough systems on
//! the way here that both turn up regularly.

pub mod paeds;
pub mod registry;

use std::borrow::Cow;
use std::path::Path;
use std::time::Instant;

use csv::StringRecord;
use log::{error, info, warn};

use crate::config::LinkageConfig;
use crate::error::Result;
use crate::identifier::{self, IdentifierKind};
use crate::model::{IncomingPatient, TransplantEpisode};
use crate::parse;
use crate::schema::{ExtractSchema, MAX_TRANSPLANTS};

pub use paeds::load_paeds;
pub use registry::load_registry;

/// Counters from one extract load
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractStats {
    /// Rows parsed into patients
    pub rows: usize,
    /// Rows dropped for a missing or malformed external id
    pub skipped: usize,
    /// Cells that needed NUL or non-ASCII characters stripped
    pub cleaned_cells: usize,
}

/// Load a UKTR extract file
///
/// # Errors
/// Fails the whole run when the file cannot be read or its column
/// layout does not match the expected table.
pub fn load_extract(
    path: &Path,
    config: &LinkageConfig,
) -> Result<(Vec<IncomingPatient>, ExtractStats)> {
    let start = Instant::now();
    let mut reader = csv::Reader::from_path(path)?;
    let schema = ExtractSchema::from_headers(reader.headers()?)?;

    let mut patients = Vec::new();
    let mut stats = ExtractStats::default();
    let slots = config.transplant_slots.min(MAX_TRANSPLANTS);

    for (line, record) in reader.records().enumerate() {
        let record = clean_record(&record?, &mut stats.cleaned_cells);
        // Header is line 1, first data row line 2
        let line = line + 2;

        let Some(uktssa_no) = schema.field(&record, "UKTR_ID").and_then(parse::parse_int)
        else {
            error!("line {line}: missing or malformed UKTR_ID, row skipped");
            stats.skipped += 1;
            continue;
        };

        patients.push(parse_row(&schema, &record, uktssa_no, slots, line));
        stats.rows += 1;
    }

    info!(
        "loaded {} extract rows from {} in {:.2?} ({} skipped, {} cells cleaned)",
        stats.rows,
        path.display(),
        start.elapsed(),
        stats.skipped,
        stats.cleaned_cells
    );
    Ok((patients, stats))
}

fn parse_row(
    schema: &ExtractSchema,
    record: &StringRecord,
    uktssa_no: i64,
    slots: usize,
    line: usize,
) -> IncomingPatient {
    let (nhs_no, chi_no, hsc_no) = national_ids(schema, record, line);

    let mut transplants = Vec::new();
    for slot in 1..=slots {
        if let Some(date) = schema
            .slot_field(record, "uktr_date_on", slot)
            .and_then(parse::parse_date)
        {
            transplants.push(parse_episode(schema, record, uktssa_no, slot, date));
        }
    }

    IncomingPatient {
        uktssa_no,
        prior_rr_no: schema
            .field(record, "UKTR_RR_ID")
            .and_then(parse::parse_int)
            .filter(|&rr_no| rr_no > 0),
        surname: schema.field(record, "UKTR_RSURNAME").map(str::to_string),
        forename: schema.field(record, "UKTR_RFORENAME").map(str::to_string),
        date_birth: schema.field(record, "UKTR_RDOB").and_then(parse::parse_date),
        date_death: schema.field(record, "UKTR_DDATE").and_then(parse::parse_date),
        sex: schema.field(record, "UKTR_RSEX").and_then(parse::parse_sex),
        postcode: schema
            .field(record, "UKTR_RPOSTCODE")
            .and_then(parse::format_postcode),
        nhs_no,
        chi_no,
        hsc_no,
        transplants,
    }
}

/// Read the three identifier columns and redistribute each value by
/// its classified scheme; the extracts are known to put CHI and HSC
/// numbers in the NHS column
fn national_ids(
    schema: &ExtractSchema,
    record: &StringRecord,
    line: usize,
) -> (Option<i64>, Option<i64>, Option<i64>) {
    let mut nhs_no = None;
    let mut chi_no = None;
    let mut hsc_no = None;

    for column in ["UKTR_RNHS_NO", "UKTR_RCHI_NO_SCOT", "UKTR_RCHI_NO_NI"] {
        let Some(value) = schema.field(record, column).and_then(parse::parse_int) else {
            continue;
        };

        let kind = identifier::classify(value);
        let slot = match kind {
            IdentifierKind::Nhs => &mut nhs_no,
            IdentifierKind::Chi => &mut chi_no,
            IdentifierKind::Hsc => &mut hsc_no,
            IdentifierKind::Invalid => {
                warn!("line {line}: {column} value {value} failed validation, dropped");
                continue;
            }
        };

        match slot {
            None => {
                *slot = Some(value);
                if kind.as_str() != column_scheme(column) {
                    warn!(
                        "line {line}: {column} carried a {} number, reassigned",
                        kind.as_str()
                    );
                }
            }
            Some(existing) if *existing != value => {
                warn!(
                    "line {line}: two different {} numbers, keeping the first",
                    kind.as_str()
                );
            }
            Some(_) => {}
        }
    }

    (nhs_no, chi_no, hsc_no)
}

fn column_scheme(column: &str) -> &'static str {
    match column {
        "UKTR_RCHI_NO_SCOT" => "CHI",
        "UKTR_RCHI_NO_NI" => "HSC",
        _ => "NHS",
    }
}

fn parse_episode(
    schema: &ExtractSchema,
    record: &StringRecord,
    uktssa_no: i64,
    slot: usize,
    registration_date: chrono::NaiveDate,
) -> TransplantEpisode {
    let text = |stem: &str| schema.slot_field(record, stem, slot).map(str::to_string);
    let date = |stem: &str| schema.slot_field(record, stem, slot).and_then(parse::parse_date);

    TransplantEpisode {
        registration_id: TransplantEpisode::registration_key(uktssa_no, slot),
        uktssa_no,
        slot,
        transplant_id: schema
            .slot_field(record, "uktr_tx_id", slot)
            .and_then(parse::parse_int),
        transplant_date: date("uktr_txdate"),
        transplant_type: text("uktr_dgrp"),
        transplant_organ: text("uktr_tx_type"),
        transplant_unit: text("uktr_tx_unit"),
        registration_date,
        registration_date_type: text("uktr_list_status"),
        registration_end_date: date("uktr_removal_date"),
        registration_end_status: text("uktr_endstat"),
        transplant_consideration: text("uktr_tx_list"),
        transplant_dialysis: text("uktr_dial_at_tx"),
        transplant_relationship: text("uktr_relationship"),
        transplant_sex: schema
            .slot_field(record, "uktr_dsex", slot)
            .and_then(parse::parse_sex),
        cause_of_failure: text("uktr_cof"),
        cause_of_failure_text: text("uktr_other_cof_text"),
        cit_mins: text("uktr_cit_mins"),
        hla_mismatch: text("uktr_hla_mm"),
        ukt_fail_date: date("uktr_faildate"),
        ukt_suspension: schema
            .slot_field(record, "uktr_suspension_", slot)
            .and_then(parse::parse_bool),
    }
}

/// Strip NUL bytes and non-ASCII residue from every cell
fn clean_record(record: &StringRecord, cleaned: &mut usize) -> StringRecord {
    let needs_cleaning = record
        .iter()
        .any(|cell| cell.bytes().any(|b| b == 0 || !b.is_ascii()));
    if !needs_cleaning {
        return record.clone();
    }

    record
        .iter()
        .map(|cell| {
            let clean = clean_cell(cell);
            if matches!(clean, Cow::Owned(_)) {
                *cleaned += 1;
            }
            clean.into_owned()
        })
        .collect()
}

fn clean_cell(cell: &str) -> Cow<'_, str> {
    if cell.bytes().all(|b| b != 0 && b.is_ascii()) {
        Cow::Borrowed(cell)
    } else {
        Cow::Owned(
            cell.chars()
                .filter(|c| *c != '\0' && c.is_ascii())
                .collect(),
        )
    }
}
