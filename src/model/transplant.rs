//! Transplant episode values.

use chrono::NaiveDate;
use log::debug;
use smallvec::SmallVec;

/// One transplant slot from an extract row, materialised only when the
/// slot carries a registration date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransplantEpisode {
    /// Composite key `{external id}_{slot}`
    pub registration_id: String,
    /// External (UKT) patient id this episode belongs to
    pub uktssa_no: i64,
    /// One-based slot position on the extract row
    pub slot: usize,
    pub transplant_id: Option<i64>,
    pub transplant_date: Option<NaiveDate>,
    pub transplant_type: Option<String>,
    pub transplant_organ: Option<String>,
    pub transplant_unit: Option<String>,
    pub registration_date: NaiveDate,
    pub registration_date_type: Option<String>,
    pub registration_end_date: Option<NaiveDate>,
    pub registration_end_status: Option<String>,
    pub transplant_consideration: Option<String>,
    pub transplant_dialysis: Option<String>,
    pub transplant_relationship: Option<String>,
    pub transplant_sex: Option<String>,
    pub cause_of_failure: Option<String>,
    pub cause_of_failure_text: Option<String>,
    pub cit_mins: Option<String>,
    pub hla_mismatch: Option<String>,
    pub ukt_fail_date: Option<NaiveDate>,
    pub ukt_suspension: Option<bool>,
}

impl TransplantEpisode {
    /// Build the composite registration key for an external id and slot
    #[must_use]
    pub fn registration_key(uktssa_no: i64, slot: usize) -> String {
        format!("{uktssa_no}_{slot}")
    }

    /// Names of the clinical fields that differ between two episodes
    #[must_use]
    pub fn diff_fields(&self, other: &Self) -> SmallVec<[&'static str; 4]> {
        let mut fields = SmallVec::new();

        macro_rules! diff {
            ($field:ident) => {
                if self.$field != other.$field {
                    fields.push(stringify!($field));
                }
            };
        }

        diff!(transplant_id);
        diff!(transplant_date);
        diff!(transplant_type);
        diff!(transplant_organ);
        diff!(transplant_unit);
        diff!(registration_date);
        diff!(registration_date_type);
        diff!(registration_end_date);
        diff!(registration_end_status);
        diff!(transplant_consideration);
        diff!(transplant_dialysis);
        diff!(transplant_relationship);
        diff!(transplant_sex);
        diff!(cause_of_failure);
        diff!(cause_of_failure_text);
        diff!(cit_mins);
        diff!(hla_mismatch);
        diff!(ukt_fail_date);
        diff!(ukt_suspension);

        for field in &fields {
            debug!(
                "transplant {} differs in {field}",
                self.registration_id
            );
        }

        fields
    }
}

/// A transplant row as held by the registry store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTransplant {
    /// Internal registry patient link, owned by the store and never
    /// overwritten by incoming data
    pub rr_no: Option<i64>,
    pub episode: TransplantEpisode,
}

impl StoredTransplant {
    /// Merge an incoming episode over a stored row, keeping the stored
    /// row's internal patient link
    #[must_use]
    pub fn merged_with(&self, incoming: &TransplantEpisode) -> Self {
        Self {
            rr_no: self.rr_no,
            episode: incoming.clone(),
        }
    }
}
