//! Conflict resolution: one winning registry record per incoming row.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::algorithm::linkage::types::MatchCandidate;
use crate::model::{IncomingPatient, RegistryPatient};
use crate::parse;
use crate::store::RegistrySnapshot;

/// Score how strongly an incoming record agrees with a registry record
///
/// Additive over independent signals: a shared national identifier
/// dominates everything, the prior-run registry id outranks the stored
/// external id, and demographics only separate otherwise-equal
/// candidates. Agreement always increases the score.
#[must_use]
pub fn score_pair(incoming: &IncomingPatient, registry: &RegistryPatient) -> u32 {
    let mut total = 0;

    let national_id_agrees = incoming
        .national_ids()
        .iter()
        .any(|&(kind, value)| registry.national_id(kind) == Some(value));
    if national_id_agrees {
        total += 50;
    }

    if incoming.prior_rr_no == Some(registry.rr_no) {
        total += 30;
    }

    if registry.uktssa_no == Some(incoming.uktssa_no) {
        total += 10;
    }

    if matches!(
        (incoming.date_birth, registry.date_birth),
        (Some(a), Some(b)) if a == b
    ) {
        total += 5;
    }

    let surname_agrees = names_agree(&incoming.surname, &registry.surname);
    let forename_agrees = names_agree(&incoming.forename, &registry.forename);
    total += match (surname_agrees, forename_agrees) {
        (true, true) => 3,
        (true, false) | (false, true) => 1,
        (false, false) => 0,
    };

    total
}

fn names_agree(left: &Option<String>, right: &Option<String>) -> bool {
    match (
        left.as_deref().and_then(parse::normalize_name),
        right.as_deref().and_then(parse::normalize_name),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Pick the winning candidate for every incoming record that has any
///
/// The winner is the strict maximum score; on a tie the candidate seen
/// first in aggregation order is kept, which makes the outcome
/// deterministic for a given input order. Records with no candidate
/// simply produce no entry; they pass through the pipeline as
/// unmatched.
#[must_use]
pub fn resolve(
    candidates: &[MatchCandidate],
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
) -> Vec<MatchCandidate> {
    let mut grouped: FxHashMap<usize, SmallVec<[MatchCandidate; 4]>> = FxHashMap::default();
    for &candidate in candidates {
        grouped.entry(candidate.incoming).or_default().push(candidate);
    }

    let mut winners = Vec::with_capacity(grouped.len());
    for index in 0..incoming.len() {
        let Some(group) = grouped.get(&index) else {
            continue;
        };
        winners.push(best_of(group, incoming, snapshot));
    }
    winners
}

/// First-seen strict-maximum selection within one group
pub(crate) fn best_of(
    group: &[MatchCandidate],
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
) -> MatchCandidate {
    let mut best = group[0];
    let mut best_score = score_pair(&incoming[best.incoming], snapshot.patient(best.registry));

    for &candidate in &group[1..] {
        let score = score_pair(
            &incoming[candidate.incoming],
            snapshot.patient(candidate.registry),
        );
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn incoming(uktssa_no: i64) -> IncomingPatient {
        IncomingPatient {
            uktssa_no,
            prior_rr_no: None,
            surname: Some("Smith".into()),
            forename: Some("Anne".into()),
            date_birth: NaiveDate::from_ymd_opt(1984, 12, 25),
            date_death: None,
            sex: None,
            postcode: None,
            nhs_no: Some(9_434_765_919),
            chi_no: None,
            hsc_no: None,
            transplants: Vec::new(),
        }
    }

    fn registry(rr_no: i64) -> RegistryPatient {
        RegistryPatient {
            rr_no,
            uktssa_no: None,
            surname: None,
            forename: None,
            date_birth: None,
            date_death: None,
            sex: None,
            nhs_no: None,
            chi_no: None,
            hsc_no: None,
            postcode: None,
            deleted: false,
        }
    }

    #[test]
    fn national_id_dominates_demographics() {
        let patient = incoming(100);

        let with_id = RegistryPatient {
            nhs_no: Some(9_434_765_919),
            ..registry(1)
        };
        let with_demographics = RegistryPatient {
            surname: Some("SMITH".into()),
            forename: Some("ANNE".into()),
            date_birth: NaiveDate::from_ymd_opt(1984, 12, 25),
            ..registry(2)
        };

        assert!(score_pair(&patient, &with_id) > score_pair(&patient, &with_demographics));
    }

    #[test]
    fn score_is_monotone_in_agreement() {
        let patient = incoming(100);

        let base = RegistryPatient {
            date_birth: NaiveDate::from_ymd_opt(1984, 12, 25),
            ..registry(1)
        };
        let more = RegistryPatient {
            surname: Some("SMITH".into()),
            ..base.clone()
        };
        let even_more = RegistryPatient {
            forename: Some("ANNE".into()),
            ..more.clone()
        };

        assert!(score_pair(&patient, &more) > score_pair(&patient, &base));
        assert!(score_pair(&patient, &even_more) > score_pair(&patient, &more));
    }

    #[test]
    fn one_name_scores_between_none_and_both() {
        let patient = incoming(100);

        let none = registry(1);
        let one = RegistryPatient {
            forename: Some("ANNE".into()),
            ..registry(2)
        };
        let both = RegistryPatient {
            surname: Some("SMITH".into()),
            forename: Some("ANNE".into()),
            ..registry(3)
        };

        assert_eq!(score_pair(&patient, &none), 0);
        assert_eq!(score_pair(&patient, &one), 1);
        assert_eq!(score_pair(&patient, &both), 3);
    }

    #[test]
    fn ties_keep_the_first_seen_candidate() {
        use crate::model::MatchMethod;

        let patients = vec![incoming(100)];
        let snapshot =
            RegistrySnapshot::from_partitions(vec![registry(1), registry(2)], Vec::new());

        let group = [
            MatchCandidate {
                incoming: 0,
                registry: 1,
                method: MatchMethod::ExactDemographic,
            },
            MatchCandidate {
                incoming: 0,
                registry: 0,
                method: MatchMethod::ExactDemographic,
            },
        ];

        let winner = best_of(&group, &patients, &snapshot);
        assert_eq!(winner.registry, 1);
    }
}
