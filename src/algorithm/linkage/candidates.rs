//! Candidate generation: one independent generator per match method.
//!
//! Every generator is a keyed equi-join between the incoming records
//! and the registry snapshot. Null keys never join, and each generator
//! emits its pairs in incoming-record order so the whole candidate
//! stream is deterministic. Registry maps are built scanning the
//! snapshot in order, which keeps live-partition rows ahead of deleted
//! rows inside every key bucket.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::algorithm::linkage::fuzzy;
use crate::algorithm::linkage::types::{self, MatchCandidate, RecordKeys};
use crate::config::LinkageConfig;
use crate::identifier::IdentifierKind;
use crate::model::{IncomingPatient, MatchMethod};
use crate::store::RegistrySnapshot;

type Bucket = SmallVec<[usize; 2]>;
type VariantBucket = SmallVec<[(usize, bool); 2]>;

/// Run every generator and return each stage's output tagged with its
/// method, in stage order
#[must_use]
pub fn generate(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
    config: &LinkageConfig,
) -> Vec<(MatchMethod, Vec<MatchCandidate>)> {
    let incoming_keys = types::incoming_keys(incoming);
    let registry_keys = types::registry_keys(snapshot.patients());

    let mut stages = vec![
        (MatchMethod::NationalId, by_national_id(incoming, snapshot)),
        (MatchMethod::RegistryId, by_registry_id(incoming, snapshot)),
        (MatchMethod::ExternalId, by_external_id(incoming, snapshot)),
        (
            MatchMethod::ExactDemographic,
            by_exact_demographics(incoming, snapshot, &incoming_keys, &registry_keys),
        ),
        (
            MatchMethod::RelaxedDemographic,
            by_relaxed_demographics(incoming, snapshot, &incoming_keys, &registry_keys),
        ),
        (
            MatchMethod::CompoundName,
            by_compound_names(incoming, snapshot, &incoming_keys, &registry_keys),
        ),
    ];

    if config.fuzzy_enabled {
        let already_matched: FxHashSet<usize> = stages
            .iter()
            .flat_map(|(_, stage)| stage)
            .map(|candidate| candidate.incoming)
            .collect();
        stages.push((
            MatchMethod::FuzzyName,
            fuzzy::by_fuzzy_names(
                incoming,
                snapshot,
                &incoming_keys,
                &registry_keys,
                &already_matched,
                config,
            ),
        ));
    }

    stages
}

/// Equi-join on NHS/CHI/HSC numbers, scheme by scheme
fn by_national_id(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
) -> Vec<MatchCandidate> {
    let mut by_id: FxHashMap<(IdentifierKind, i64), Bucket> = FxHashMap::default();
    for (index, patient) in snapshot.patients().iter().enumerate() {
        for kind in [IdentifierKind::Nhs, IdentifierKind::Chi, IdentifierKind::Hsc] {
            if let Some(value) = patient.national_id(kind) {
                by_id.entry((kind, value)).or_default().push(index);
            }
        }
    }

    let mut candidates = Vec::new();
    for (index, patient) in incoming.iter().enumerate() {
        for (kind, value) in patient.national_ids() {
            if let Some(bucket) = by_id.get(&(kind, value)) {
                for &registry in bucket {
                    candidates.push(MatchCandidate {
                        incoming: index,
                        registry,
                        method: MatchMethod::NationalId,
                    });
                }
            }
        }
    }
    candidates
}

/// Reclaim joins on a prior run's registry id
fn by_registry_id(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
) -> Vec<MatchCandidate> {
    let mut by_rr_no: FxHashMap<i64, Bucket> = FxHashMap::default();
    for (index, patient) in snapshot.patients().iter().enumerate() {
        by_rr_no.entry(patient.rr_no).or_default().push(index);
    }

    let mut candidates = Vec::new();
    for (index, patient) in incoming.iter().enumerate() {
        if let Some(bucket) = patient.prior_rr_no.and_then(|prior| by_rr_no.get(&prior)) {
            for &registry in bucket {
                candidates.push(MatchCandidate {
                    incoming: index,
                    registry,
                    method: MatchMethod::RegistryId,
                });
            }
        }
    }
    candidates
}

/// Join on the external id the registry stored at a previous link
fn by_external_id(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
) -> Vec<MatchCandidate> {
    let mut by_external: FxHashMap<i64, Bucket> = FxHashMap::default();
    for (index, patient) in snapshot.patients().iter().enumerate() {
        if let Some(external) = patient.uktssa_no {
            by_external.entry(external).or_default().push(index);
        }
    }

    let mut candidates = Vec::new();
    for (index, patient) in incoming.iter().enumerate() {
        if let Some(bucket) = by_external.get(&patient.uktssa_no) {
            for &registry in bucket {
                candidates.push(MatchCandidate {
                    incoming: index,
                    registry,
                    method: MatchMethod::ExternalId,
                });
            }
        }
    }
    candidates
}

/// Join on date of birth plus both names
fn by_exact_demographics(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
    incoming_keys: &[RecordKeys],
    registry_keys: &[RecordKeys],
) -> Vec<MatchCandidate> {
    let mut by_demo: FxHashMap<(NaiveDate, String, String), Bucket> = FxHashMap::default();
    for (index, patient) in snapshot.patients().iter().enumerate() {
        let keys = &registry_keys[index];
        if let (Some(dob), Some(surname), Some(forename)) =
            (patient.date_birth, &keys.surname, &keys.forename)
        {
            by_demo
                .entry((dob, surname.clone(), forename.clone()))
                .or_default()
                .push(index);
        }
    }

    let mut candidates = Vec::new();
    for (index, patient) in incoming.iter().enumerate() {
        let keys = &incoming_keys[index];
        if let (Some(dob), Some(surname), Some(forename)) =
            (patient.date_birth, &keys.surname, &keys.forename)
        {
            if let Some(bucket) = by_demo.get(&(dob, surname.clone(), forename.clone())) {
                for &registry in bucket {
                    candidates.push(MatchCandidate {
                        incoming: index,
                        registry,
                        method: MatchMethod::ExactDemographic,
                    });
                }
            }
        }
    }
    candidates
}

/// Joins on date of birth, postcode and one of the two names
fn by_relaxed_demographics(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
    incoming_keys: &[RecordKeys],
    registry_keys: &[RecordKeys],
) -> Vec<MatchCandidate> {
    let mut by_surname: FxHashMap<(NaiveDate, String, String), Bucket> = FxHashMap::default();
    let mut by_forename: FxHashMap<(NaiveDate, String, String), Bucket> = FxHashMap::default();

    for (index, patient) in snapshot.patients().iter().enumerate() {
        let keys = &registry_keys[index];
        let (Some(dob), Some(postcode)) = (patient.date_birth, &keys.postcode) else {
            continue;
        };
        if let Some(surname) = &keys.surname {
            by_surname
                .entry((dob, surname.clone(), postcode.clone()))
                .or_default()
                .push(index);
        }
        if let Some(forename) = &keys.forename {
            by_forename
                .entry((dob, forename.clone(), postcode.clone()))
                .or_default()
                .push(index);
        }
    }

    let mut candidates = Vec::new();
    for (index, patient) in incoming.iter().enumerate() {
        let keys = &incoming_keys[index];
        let (Some(dob), Some(postcode)) = (patient.date_birth, &keys.postcode) else {
            continue;
        };

        if let Some(surname) = &keys.surname {
            if let Some(bucket) = by_surname.get(&(dob, surname.clone(), postcode.clone())) {
                for &registry in bucket {
                    candidates.push(MatchCandidate {
                        incoming: index,
                        registry,
                        method: MatchMethod::RelaxedDemographic,
                    });
                }
            }
        }
        if let Some(forename) = &keys.forename {
            if let Some(bucket) = by_forename.get(&(dob, forename.clone(), postcode.clone())) {
                for &registry in bucket {
                    candidates.push(MatchCandidate {
                        incoming: index,
                        registry,
                        method: MatchMethod::RelaxedDemographic,
                    });
                }
            }
        }
    }
    candidates
}

/// First-token variants of a compound name pair; the original pair is
/// first and flagged, split variants follow only when a name actually
/// has more than one token
#[must_use]
pub fn name_variants(keys: &RecordKeys) -> SmallVec<[(Option<String>, Option<String>, bool); 4]> {
    let first_token = |name: &Option<String>| -> Option<String> {
        let full = name.as_deref()?;
        let first = full.split_whitespace().next()?;
        if first == full {
            None
        } else {
            Some(first.to_string())
        }
    };

    let surname_split = first_token(&keys.surname);
    let forename_split = first_token(&keys.forename);

    let mut variants = SmallVec::new();
    variants.push((keys.surname.clone(), keys.forename.clone(), true));

    if let Some(surname) = &surname_split {
        variants.push((Some(surname.clone()), keys.forename.clone(), false));
    }
    if let Some(forename) = &forename_split {
        variants.push((keys.surname.clone(), Some(forename.clone()), false));
    }
    if let (Some(surname), Some(forename)) = (&surname_split, &forename_split) {
        variants.push((Some(surname.clone()), Some(forename.clone()), false));
    }

    variants
}

/// Re-run the exact and relaxed joins over compound-name variants
///
/// Pairs where both sides used their original names are skipped; those
/// already came out of the plain demographic generators.
fn by_compound_names(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
    incoming_keys: &[RecordKeys],
    registry_keys: &[RecordKeys],
) -> Vec<MatchCandidate> {
    let mut exact: FxHashMap<(NaiveDate, String, String), VariantBucket> = FxHashMap::default();
    let mut relaxed_surname: FxHashMap<(NaiveDate, String, String), VariantBucket> =
        FxHashMap::default();
    let mut relaxed_forename: FxHashMap<(NaiveDate, String, String), VariantBucket> =
        FxHashMap::default();

    for (index, patient) in snapshot.patients().iter().enumerate() {
        let Some(dob) = patient.date_birth else {
            continue;
        };
        let postcode = &registry_keys[index].postcode;

        for (surname, forename, original) in name_variants(&registry_keys[index]) {
            if let (Some(surname), Some(forename)) = (&surname, &forename) {
                exact
                    .entry((dob, surname.clone(), forename.clone()))
                    .or_default()
                    .push((index, original));
            }
            if let Some(postcode) = postcode {
                if let Some(surname) = &surname {
                    relaxed_surname
                        .entry((dob, surname.clone(), postcode.clone()))
                        .or_default()
                        .push((index, original));
                }
                if let Some(forename) = &forename {
                    relaxed_forename
                        .entry((dob, forename.clone(), postcode.clone()))
                        .or_default()
                        .push((index, original));
                }
            }
        }
    }

    let mut candidates = Vec::new();
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();

    for (index, patient) in incoming.iter().enumerate() {
        let Some(dob) = patient.date_birth else {
            continue;
        };
        let postcode = &incoming_keys[index].postcode;

        let probe = |bucket: Option<&VariantBucket>,
                         incoming_original: bool,
                         seen: &mut FxHashSet<(usize, usize)>,
                         candidates: &mut Vec<MatchCandidate>| {
            let Some(bucket) = bucket else { return };
            for &(registry, registry_original) in bucket {
                if incoming_original && registry_original {
                    continue;
                }
                if seen.insert((index, registry)) {
                    candidates.push(MatchCandidate {
                        incoming: index,
                        registry,
                        method: MatchMethod::CompoundName,
                    });
                }
            }
        };

        for (surname, forename, original) in name_variants(&incoming_keys[index]) {
            if let (Some(surname), Some(forename)) = (&surname, &forename) {
                probe(
                    exact.get(&(dob, surname.clone(), forename.clone())),
                    original,
                    &mut seen,
                    &mut candidates,
                );
            }
            if let Some(postcode) = postcode {
                if let Some(surname) = &surname {
                    probe(
                        relaxed_surname.get(&(dob, surname.clone(), postcode.clone())),
                        original,
                        &mut seen,
                        &mut candidates,
                    );
                }
                if let Some(forename) = &forename {
                    probe(
                        relaxed_forename.get(&(dob, forename.clone(), postcode.clone())),
                        original,
                        &mut seen,
                        &mut candidates,
                    );
                }
            }
        }
    }

    candidates
}
