//! Fuzzy-name candidate generation over the residual unmatched records.
//!
//! Only records no earlier generator produced a candidate for are
//! considered. Registry names are bucketed by first letter, close
//! names are selected by Levenshtein distance with a per-name cap, and
//! a close name only yields a candidate when the demographic join
//! logic holds with the fuzzy name standing in: date of birth must
//! agree, plus the other name or the postcode. The stage runs in
//! parallel per residual record; results come back in record order, so
//! the output is an ordinary ordered sequence like every other stage.

use log::info;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use strsim::levenshtein;

use crate::algorithm::linkage::types::{MatchCandidate, RecordKeys};
use crate::config::LinkageConfig;
use crate::model::{IncomingPatient, MatchMethod};
use crate::store::RegistrySnapshot;

type LetterBuckets = FxHashMap<char, Vec<usize>>;

/// Which of the two names the edit distance is applied to
#[derive(Clone, Copy)]
enum FuzzyOn {
    Surname,
    Forename,
}

/// Generate fuzzy-name candidates for the residual unmatched records
#[must_use]
pub fn by_fuzzy_names(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
    incoming_keys: &[RecordKeys],
    registry_keys: &[RecordKeys],
    already_matched: &FxHashSet<usize>,
    config: &LinkageConfig,
) -> Vec<MatchCandidate> {
    let residual: Vec<usize> = (0..incoming.len())
        .filter(|index| !already_matched.contains(index))
        .collect();

    if residual.is_empty() {
        return Vec::new();
    }
    info!("fuzzy-name stage over {} residual records", residual.len());

    let surname_buckets = letter_buckets(registry_keys, |keys| keys.surname.as_deref());
    let forename_buckets = letter_buckets(registry_keys, |keys| keys.forename.as_deref());

    residual
        .par_iter()
        .map(|&index| {
            let mut found: SmallVec<[MatchCandidate; 4]> = SmallVec::new();
            close_name_candidates(
                index,
                FuzzyOn::Surname,
                incoming,
                snapshot,
                incoming_keys,
                registry_keys,
                &surname_buckets,
                config,
                &mut found,
            );
            close_name_candidates(
                index,
                FuzzyOn::Forename,
                incoming,
                snapshot,
                incoming_keys,
                registry_keys,
                &forename_buckets,
                config,
                &mut found,
            );
            found
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

fn letter_buckets(
    registry_keys: &[RecordKeys],
    name: impl Fn(&RecordKeys) -> Option<&str>,
) -> LetterBuckets {
    let mut buckets = LetterBuckets::default();
    for (index, keys) in registry_keys.iter().enumerate() {
        if let Some(first) = name(keys).and_then(|n| n.chars().next()) {
            buckets.entry(first).or_default().push(index);
        }
    }
    buckets
}

#[allow(clippy::too_many_arguments)]
fn close_name_candidates(
    index: usize,
    fuzzy_on: FuzzyOn,
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
    incoming_keys: &[RecordKeys],
    registry_keys: &[RecordKeys],
    buckets: &LetterBuckets,
    config: &LinkageConfig,
    found: &mut SmallVec<[MatchCandidate; 4]>,
) {
    let patient = &incoming[index];
    let keys = &incoming_keys[index];

    let Some(dob) = patient.date_birth else {
        return;
    };
    let name = match fuzzy_on {
        FuzzyOn::Surname => keys.surname.as_deref(),
        FuzzyOn::Forename => keys.forename.as_deref(),
    };
    let Some(name) = name else { return };
    let Some(first) = name.chars().next() else {
        return;
    };
    let Some(bucket) = buckets.get(&first) else {
        return;
    };

    // Close-name shortlist: distance-ordered (stable, so snapshot
    // order breaks ties), capped per name
    let mut close: SmallVec<[(usize, usize); 8]> = SmallVec::new();
    for &registry in bucket {
        let registry_name = match fuzzy_on {
            FuzzyOn::Surname => registry_keys[registry].surname.as_deref(),
            FuzzyOn::Forename => registry_keys[registry].forename.as_deref(),
        };
        let Some(registry_name) = registry_name else {
            continue;
        };
        if registry_name == name {
            continue;
        }
        let distance = levenshtein(name, registry_name);
        if distance <= config.fuzzy_max_distance {
            close.push((distance, registry));
        }
    }
    close.sort_by_key(|&(distance, _)| distance);
    close.truncate(config.fuzzy_candidate_cap);

    for &(_, registry) in &close {
        let candidate = snapshot.patient(registry);
        if candidate.date_birth != Some(dob) {
            continue;
        }

        let other_name_agrees = match fuzzy_on {
            FuzzyOn::Surname => agrees(&keys.forename, &registry_keys[registry].forename),
            FuzzyOn::Forename => agrees(&keys.surname, &registry_keys[registry].surname),
        };
        let postcode_agrees = agrees(&keys.postcode, &registry_keys[registry].postcode);

        if other_name_agrees || postcode_agrees {
            found.push(MatchCandidate {
                incoming: index,
                registry,
                method: MatchMethod::FuzzyName,
            });
        }
    }
}

fn agrees(left: &Option<String>, right: &Option<String>) -> bool {
    matches!((left, right), (Some(a), Some(b)) if a == b)
}
