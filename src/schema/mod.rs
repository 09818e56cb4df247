//! Column layout of the UKTR extract file.
//!
//! The extract is a fixed 125-column CSV: eleven patient head columns
//! followed by six transplant slots of nineteen named fields each. The
//! layout is verified up front and the run fails outright on any
//! mismatch, because a silently shifted column would corrupt every row.
//! All row access afterwards goes through named fields, never raw
//! positions.

use csv::StringRecord;
use rustc_hash::FxHashMap;

use crate::error::{LinkError, Result};

/// Number of transplant slots carried per extract row
pub const MAX_TRANSPLANTS: usize = 6;

/// Patient head columns, in file order
pub const HEAD_COLUMNS: [&str; 11] = [
    "UKTR_ID",
    "UKTR_RR_ID",
    "UKTR_RSURNAME",
    "UKTR_RFORENAME",
    "UKTR_RDOB",
    "UKTR_RSEX",
    "UKTR_RPOSTCODE",
    "UKTR_RNHS_NO",
    "UKTR_RCHI_NO_SCOT",
    "UKTR_RCHI_NO_NI",
    "UKTR_DDATE",
];

/// Per-slot field name stems, in file order; the slot number is
/// appended directly (`uktr_suspension_` keeps its trailing underscore
/// as delivered)
pub const SLOT_FIELDS: [&str; 19] = [
    "uktr_date_on",
    "uktr_list_status",
    "uktr_endstat",
    "uktr_tx_list",
    "uktr_suspension_",
    "uktr_removal_date",
    "uktr_tx_id",
    "uktr_txdate",
    "uktr_dgrp",
    "uktr_dsex",
    "uktr_relationship",
    "uktr_tx_type",
    "uktr_tx_unit",
    "uktr_faildate",
    "uktr_dial_at_tx",
    "uktr_cit_mins",
    "uktr_hla_mm",
    "uktr_cof",
    "uktr_other_cof_text",
];

/// Build the slot-qualified column name for a field stem
#[must_use]
pub fn slot_column(stem: &str, slot: usize) -> String {
    format!("{stem}{slot}")
}

/// The full expected column list, in file order
#[must_use]
pub fn expected_columns() -> Vec<String> {
    let mut columns: Vec<String> = HEAD_COLUMNS.iter().map(ToString::to_string).collect();
    for slot in 1..=MAX_TRANSPLANTS {
        for stem in SLOT_FIELDS {
            columns.push(slot_column(stem, slot));
        }
    }
    columns
}

/// Verified header layout of an extract file, giving named access to
/// row cells
#[derive(Debug)]
pub struct ExtractSchema {
    index: FxHashMap<String, usize>,
}

impl ExtractSchema {
    /// Verify a header row against the expected layout
    ///
    /// # Errors
    /// `LinkError::Schema` when the column count or any column name
    /// differs from the expected table
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let expected = expected_columns();

        if headers.len() != expected.len() {
            return Err(LinkError::Schema(format!(
                "expected {} columns, got {}",
                expected.len(),
                headers.len()
            )));
        }

        for (position, (want, got)) in expected.iter().zip(headers.iter()).enumerate() {
            if want != got.trim() {
                return Err(LinkError::Schema(format!(
                    "column {} is {:?}, expected {:?}",
                    position + 1,
                    got,
                    want
                )));
            }
        }

        let index = expected
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        Ok(Self { index })
    }

    /// Read a head-column cell by name; empty cells come back as `None`
    #[must_use]
    pub fn field<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        let cell = record.get(*self.index.get(name)?)?.trim();
        if cell.is_empty() { None } else { Some(cell) }
    }

    /// Read a slot-qualified cell by field stem and slot number
    #[must_use]
    pub fn slot_field<'r>(
        &self,
        record: &'r StringRecord,
        stem: &str,
        slot: usize,
    ) -> Option<&'r str> {
        self.field(record, &slot_column(stem, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_headers() -> StringRecord {
        StringRecord::from(expected_columns())
    }

    #[test]
    fn expected_layout_is_125_columns() {
        assert_eq!(expected_columns().len(), 125);
    }

    #[test]
    fn accepts_the_expected_layout() {
        assert!(ExtractSchema::from_headers(&good_headers()).is_ok());
    }

    #[test]
    fn rejects_wrong_column_count() {
        let mut columns = expected_columns();
        columns.pop();
        let err = ExtractSchema::from_headers(&StringRecord::from(columns));
        assert!(matches!(err, Err(LinkError::Schema(_))));
    }

    #[test]
    fn rejects_renamed_column() {
        let mut columns = expected_columns();
        columns[2] = "UKTR_SURNAME".to_string();
        let err = ExtractSchema::from_headers(&StringRecord::from(columns));
        assert!(matches!(err, Err(LinkError::Schema(_))));
    }

    #[test]
    fn named_access_reads_cells() {
        let schema = ExtractSchema::from_headers(&good_headers()).unwrap();
        let mut cells = vec![String::new(); 125];
        cells[0] = "100001".to_string();
        cells[2] = " SMITH ".to_string();
        cells[11] = "01/02/2003".to_string(); // uktr_date_on1
        let record = StringRecord::from(cells);

        assert_eq!(schema.field(&record, "UKTR_ID"), Some("100001"));
        assert_eq!(schema.field(&record, "UKTR_RSURNAME"), Some("SMITH"));
        assert_eq!(schema.field(&record, "UKTR_RFORENAME"), None);
        assert_eq!(
            schema.slot_field(&record, "uktr_date_on", 1),
            Some("01/02/2003")
        );
        assert_eq!(schema.slot_field(&record, "uktr_date_on", 2), None);
    }
}
