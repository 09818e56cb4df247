//! Shared types for the linkage stages.

use crate::model::{IncomingPatient, MatchMethod, RegistryPatient};
use crate::parse;

/// One proposed pairing of an incoming record with a registry record,
/// by snapshot index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate {
    /// Index into the incoming slice
    pub incoming: usize,
    /// Index into the registry snapshot
    pub registry: usize,
    /// Generator that proposed the pair
    pub method: MatchMethod,
}

/// Normalised join keys for one record, computed once per run
#[derive(Debug, Clone)]
pub struct RecordKeys {
    pub surname: Option<String>,
    pub forename: Option<String>,
    pub postcode: Option<String>,
}

impl RecordKeys {
    fn new(
        surname: Option<&str>,
        forename: Option<&str>,
        postcode: Option<&str>,
    ) -> Self {
        Self {
            surname: surname.and_then(parse::normalize_name),
            forename: forename.and_then(parse::normalize_name),
            postcode: postcode.and_then(parse::postcode_key),
        }
    }
}

/// Precompute join keys for the incoming side
#[must_use]
pub fn incoming_keys(incoming: &[IncomingPatient]) -> Vec<RecordKeys> {
    incoming
        .iter()
        .map(|patient| {
            RecordKeys::new(
                patient.surname.as_deref(),
                patient.forename.as_deref(),
                patient.postcode.as_deref(),
            )
        })
        .collect()
}

/// Precompute join keys for the registry side
#[must_use]
pub fn registry_keys(registry: &[RegistryPatient]) -> Vec<RecordKeys> {
    registry
        .iter()
        .map(|patient| {
            RecordKeys::new(
                patient.surname.as_deref(),
                patient.forename.as_deref(),
                patient.postcode.as_deref(),
            )
        })
        .collect()
}
