//! Patient records on both sides of the linkage.

use chrono::NaiveDate;
use log::debug;
use smallvec::SmallVec;

use crate::identifier::IdentifierKind;
use crate::model::transition::{MatchMethod, Transition};
use crate::model::transplant::TransplantEpisode;

/// One patient row from the UKTR extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingPatient {
    /// External (UKT) patient id, the extract's own key
    pub uktssa_no: i64,
    /// Registry id established by a previous run, when the extract
    /// carries one
    pub prior_rr_no: Option<i64>,
    pub surname: Option<String>,
    pub forename: Option<String>,
    pub date_birth: Option<NaiveDate>,
    pub date_death: Option<NaiveDate>,
    pub sex: Option<String>,
    pub postcode: Option<String>,
    pub nhs_no: Option<i64>,
    pub chi_no: Option<i64>,
    pub hsc_no: Option<i64>,
    /// Episodes for the slots that carried a registration date
    pub transplants: Vec<TransplantEpisode>,
}

impl IncomingPatient {
    /// The populated national identifiers, tagged by scheme
    #[must_use]
    pub fn national_ids(&self) -> SmallVec<[(IdentifierKind, i64); 3]> {
        let mut ids = SmallVec::new();
        if let Some(nhs) = self.nhs_no {
            ids.push((IdentifierKind::Nhs, nhs));
        }
        if let Some(chi) = self.chi_no {
            ids.push((IdentifierKind::Chi, chi));
        }
        if let Some(hsc) = self.hsc_no {
            ids.push((IdentifierKind::Hsc, hsc));
        }
        ids
    }
}

/// One patient row from the registry, live or deleted partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPatient {
    /// Internal registry id, the registry's own key
    pub rr_no: i64,
    /// External (UKT) id stored from a previous link, if any
    pub uktssa_no: Option<i64>,
    pub surname: Option<String>,
    pub forename: Option<String>,
    pub date_birth: Option<NaiveDate>,
    pub date_death: Option<NaiveDate>,
    pub sex: Option<String>,
    pub nhs_no: Option<i64>,
    pub chi_no: Option<i64>,
    pub hsc_no: Option<i64>,
    /// Current postcode, joined from the latest residency
    pub postcode: Option<String>,
    /// True when the row comes from the deleted partition
    pub deleted: bool,
}

impl RegistryPatient {
    /// The stored national identifier for a given scheme
    #[must_use]
    pub const fn national_id(&self, kind: IdentifierKind) -> Option<i64> {
        match kind {
            IdentifierKind::Nhs => self.nhs_no,
            IdentifierKind::Chi => self.chi_no,
            IdentifierKind::Hsc => self.hsc_no,
            IdentifierKind::Invalid => None,
        }
    }
}

/// Previously imported extract demographics, keyed by external id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UktPatient {
    pub uktssa_no: i64,
    /// Registry link established at import time
    pub rr_no: Option<i64>,
    pub surname: Option<String>,
    pub forename: Option<String>,
    pub sex: Option<String>,
    pub postcode: Option<String>,
    pub date_birth: Option<NaiveDate>,
    pub date_death: Option<NaiveDate>,
    pub nhs_no: Option<i64>,
    pub chi_no: Option<i64>,
    pub hsc_no: Option<i64>,
}

impl UktPatient {
    /// Build the staged row for an incoming patient and its resolved
    /// registry link
    #[must_use]
    pub fn from_incoming(incoming: &IncomingPatient, rr_no: Option<i64>) -> Self {
        Self {
            uktssa_no: incoming.uktssa_no,
            rr_no,
            surname: incoming.surname.clone(),
            forename: incoming.forename.clone(),
            sex: incoming.sex.clone(),
            postcode: incoming.postcode.clone(),
            date_birth: incoming.date_birth,
            date_death: incoming.date_death,
            nhs_no: incoming.nhs_no,
            chi_no: incoming.chi_no,
            hsc_no: incoming.hsc_no,
        }
    }

    /// Merge an incoming row over a stored row
    ///
    /// Demographics always follow the file; the registry link keeps
    /// the stored value unless this run resolved one.
    #[must_use]
    pub fn merged_with(&self, incoming: &Self) -> Self {
        Self {
            rr_no: incoming.rr_no.or(self.rr_no),
            ..incoming.clone()
        }
    }

    /// Names of the demographic fields that differ, the registry link
    /// excluded
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

        diff!(surname);
        diff!(forename);
        diff!(sex);
        diff!(postcode);
        diff!(date_birth);
        diff!(date_death);
        diff!(nhs_no);
        diff!(chi_no);
        diff!(hsc_no);

        for field in &fields {
            debug!("patient {} differs in {field}", self.uktssa_no);
        }

        fields
    }
}

/// Final linkage outcome for one extract row
#[derive(Debug, Clone)]
pub struct LinkedPatient {
    pub incoming: IncomingPatient,
    /// Winning registry record, when one was resolved
    pub matched: Option<RegistryPatient>,
    /// Method that produced the winning candidate
    pub method: Option<MatchMethod>,
    pub transition: Transition,
}

impl LinkedPatient {
    /// Registry id of the winning match, if any
    #[must_use]
    pub fn rr_no(&self) -> Option<i64> {
        self.matched.as_ref().map(|patient| patient.rr_no)
    }

    /// Whether this run established a match
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}
