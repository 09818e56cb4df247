//! End-to-end tests for the patient linkage pipeline.

use chrono::NaiveDate;
use nhsbt_link::{
    run_linkage, IncomingPatient, LinkageConfig, MatchMethod, RegistryPatient, RegistrySnapshot,
    Transition,
};

const VALID_NHS: i64 = 9_434_765_919;

fn dob() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

fn incoming(uktssa_no: i64) -> IncomingPatient {
    IncomingPatient {
        uktssa_no,
        prior_rr_no: None,
        surname: Some("SMITH".into()),
        forename: Some("JOHN".into()),
        date_birth: Some(dob()),
        date_death: None,
        sex: Some("1".into()),
        postcode: Some("AB1 2CD".into()),
        nhs_no: None,
        chi_no: None,
        hsc_no: None,
        transplants: Vec::new(),
    }
}

fn registry(rr_no: i64) -> RegistryPatient {
    RegistryPatient {
        rr_no,
        uktssa_no: None,
        surname: Some("SMITH".into()),
        forename: Some("JOHN".into()),
        date_birth: Some(dob()),
        date_death: None,
        sex: Some("1".into()),
        nhs_no: None,
        chi_no: None,
        hsc_no: None,
        postcode: Some("AB1 2CD".into()),
        deleted: false,
    }
}

#[test]
fn national_id_match_is_single_candidate() {
    let patient = IncomingPatient {
        nhs_no: Some(VALID_NHS),
        surname: Some("DIFFERENT".into()),
        forename: None,
        date_birth: None,
        postcode: None,
        ..incoming(100)
    };
    let record = RegistryPatient {
        nhs_no: Some(VALID_NHS),
        surname: Some("OTHER".into()),
        forename: None,
        date_birth: None,
        postcode: None,
        ..registry(1)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![record], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].rr_no(), Some(1));
    assert_eq!(linked[0].method, Some(MatchMethod::NationalId));
    assert_eq!(linked[0].transition, Transition::NewMatch);
}

#[test]
fn postcode_anchored_candidate_outscores_partial_agreement() {
    // Full demographic agreement vs dob+surname+postcode only
    let full = registry(1);
    let partial = RegistryPatient {
        forename: Some("JAMES".into()),
        ..registry(2)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![partial, full], Vec::new());
    let linked = run_linkage(&[incoming(100)], &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked[0].rr_no(), Some(1));
}

#[test]
fn changed_prior_link_classifies_as_different_match() {
    let patient = IncomingPatient {
        prior_rr_no: Some(100),
        ..incoming(700)
    };
    let record = registry(200);

    let snapshot = RegistrySnapshot::from_partitions(vec![record], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked[0].rr_no(), Some(200));
    assert_eq!(linked[0].transition, Transition::DifferentMatch);
    assert_eq!(linked[0].transition.legacy_code(), 2);
}

#[test]
fn prior_link_with_no_candidates_is_used_to_match() {
    let patient = IncomingPatient {
        prior_rr_no: Some(100),
        surname: Some("NOMATCH".into()),
        forename: Some("NOBODY".into()),
        date_birth: None,
        postcode: None,
        ..incoming(700)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![registry(1)], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert!(linked[0].matched.is_none());
    assert_eq!(linked[0].transition, Transition::UsedToMatch);
    assert_eq!(linked[0].transition.legacy_code(), 3);
}

#[test]
fn live_record_beats_its_deleted_copy() {
    // Restored patient: registry id 555 exists in both partitions
    let live = registry(555);
    let deleted = RegistryPatient {
        deleted: true,
        ..registry(555)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![live], vec![deleted]);
    let linked = run_linkage(&[incoming(100)], &snapshot, &LinkageConfig::default()).unwrap();

    let matched = linked[0].matched.as_ref().unwrap();
    assert_eq!(matched.rr_no, 555);
    assert!(!matched.deleted);
}

#[test]
fn deleted_only_match_still_surfaces() {
    let deleted = RegistryPatient {
        deleted: true,
        ..registry(555)
    };

    let snapshot = RegistrySnapshot::from_partitions(Vec::new(), vec![deleted]);
    let linked = run_linkage(&[incoming(100)], &snapshot, &LinkageConfig::default()).unwrap();

    let matched = linked[0].matched.as_ref().unwrap();
    assert!(matched.deleted);
}

#[test]
fn invalid_national_id_still_matches_demographically() {
    // Checksum-failing NHS number on both sides: never an id join key,
    // but full demographics still pair the records
    let patient = IncomingPatient {
        nhs_no: Some(9_434_765_918),
        ..incoming(100)
    };
    let record = RegistryPatient {
        nhs_no: None,
        ..registry(1)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![record], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked[0].rr_no(), Some(1));
    assert_eq!(linked[0].method, Some(MatchMethod::ExactDemographic));
}

#[test]
fn resolver_returns_exactly_one_match_per_record() {
    let candidates: Vec<RegistryPatient> = (1..=5).map(registry).collect();
    let snapshot = RegistrySnapshot::from_partitions(candidates, Vec::new());

    let patients = vec![incoming(100), incoming(200)];
    let linked = run_linkage(&patients, &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked.len(), 2);
    for row in &linked {
        assert!(row.matched.is_some());
    }
}

#[test]
fn tie_break_is_deterministic_across_runs() {
    let candidates: Vec<RegistryPatient> = (1..=4).map(registry).collect();
    let snapshot = RegistrySnapshot::from_partitions(candidates, Vec::new());
    let patients = vec![incoming(100)];

    let first = run_linkage(&patients, &snapshot, &LinkageConfig::default()).unwrap();
    for _ in 0..10 {
        let again = run_linkage(&patients, &snapshot, &LinkageConfig::default()).unwrap();
        assert_eq!(again[0].rr_no(), first[0].rr_no());
    }
    // First candidate in aggregation order wins the tie
    assert_eq!(first[0].rr_no(), Some(1));
}

#[test]
fn fuzzy_stage_catches_a_misspelled_surname() {
    // No postcode on the incoming side, so the relaxed joins cannot
    // pair them and the record reaches the fuzzy stage
    let patient = IncomingPatient {
        surname: Some("SMYTH".into()),
        postcode: None,
        ..incoming(100)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![registry(1)], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked[0].rr_no(), Some(1));
    assert_eq!(linked[0].method, Some(MatchMethod::FuzzyName));
}

#[test]
fn fuzzy_stage_respects_the_disable_flag() {
    let patient = IncomingPatient {
        surname: Some("SMYTH".into()),
        // Drop the postcode so only the fuzzy stage could pair them
        postcode: None,
        ..incoming(100)
    };
    let record = RegistryPatient {
        postcode: None,
        ..registry(1)
    };

    let config = LinkageConfig {
        fuzzy_enabled: false,
        ..LinkageConfig::default()
    };
    let snapshot = RegistrySnapshot::from_partitions(vec![record], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &config).unwrap();

    assert!(linked[0].matched.is_none());
}

#[test]
fn compound_surname_matches_on_its_first_token() {
    // No postcode, so only the first-token variant can pair them
    let patient = IncomingPatient {
        surname: Some("SMITH JONES".into()),
        postcode: None,
        ..incoming(100)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![registry(1)], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked[0].rr_no(), Some(1));
    assert_eq!(linked[0].method, Some(MatchMethod::CompoundName));
}

#[test]
fn unmatched_record_passes_through() {
    let patient = IncomingPatient {
        surname: Some("UNKNOWN".into()),
        forename: Some("NOBODY".into()),
        postcode: None,
        ..incoming(100)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![registry(1)], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert!(linked[0].matched.is_none());
    assert_eq!(linked[0].method, None);
    assert_eq!(linked[0].transition, Transition::NoPriorNoMatch);
    assert_eq!(linked[0].transition.legacy_code(), 0);
}

#[test]
fn prior_registry_id_reclaims_the_link() {
    // No shared identifiers or demographics, only the stored prior id
    let patient = IncomingPatient {
        surname: Some("MARRIED-NAME".into()),
        forename: Some("ANNE".into()),
        date_birth: NaiveDate::from_ymd_opt(1980, 5, 5),
        postcode: None,
        prior_rr_no: Some(42),
        ..incoming(100)
    };
    let record = RegistryPatient {
        surname: Some("MAIDEN".into()),
        forename: Some("ANNE".into()),
        date_birth: NaiveDate::from_ymd_opt(1980, 6, 6),
        postcode: None,
        ..registry(42)
    };

    let snapshot = RegistrySnapshot::from_partitions(vec![record], Vec::new());
    let linked = run_linkage(&[patient], &snapshot, &LinkageConfig::default()).unwrap();

    assert_eq!(linked[0].rr_no(), Some(42));
    assert_eq!(linked[0].method, Some(MatchMethod::RegistryId));
    assert_eq!(linked[0].transition, Transition::SameMatch);
}
