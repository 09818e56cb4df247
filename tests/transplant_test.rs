//! Tests for transplant linking and import-side staging.

use chrono::NaiveDate;
use nhsbt_link::report::stage;
use nhsbt_link::{
    link_patient_transplants, AuditReport, IncomingPatient, LinkageConfig, LinkageConfigBuilder,
    LinkedPatient, MemoryStore, RegistryPatient, RegistryStore, StoredTransplant, Transition,
    TransplantEpisode, TransplantOutcome, UktPatient,
};
use rustc_hash::FxHashSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn episode(uktssa_no: i64, slot: usize) -> TransplantEpisode {
    TransplantEpisode {
        registration_id: TransplantEpisode::registration_key(uktssa_no, slot),
        uktssa_no,
        slot,
        transplant_id: Some(9001),
        transplant_date: Some(date(2020, 3, 15)),
        transplant_type: Some("DBD".into()),
        transplant_organ: Some("Kidney".into()),
        transplant_unit: Some("Bristol".into()),
        registration_date: date(2020, 3, 1),
        registration_date_type: None,
        registration_end_date: None,
        registration_end_status: None,
        transplant_consideration: None,
        transplant_dialysis: None,
        transplant_relationship: None,
        transplant_sex: None,
        cause_of_failure: None,
        cause_of_failure_text: None,
        cit_mins: None,
        hla_mismatch: None,
        ukt_fail_date: None,
        ukt_suspension: None,
    }
}

fn linked(uktssa_no: i64, rr_no: i64, transplants: Vec<TransplantEpisode>) -> LinkedPatient {
    LinkedPatient {
        incoming: IncomingPatient {
            uktssa_no,
            prior_rr_no: None,
            surname: Some("SMITH".into()),
            forename: Some("JOHN".into()),
            date_birth: Some(date(1970, 1, 1)),
            date_death: None,
            sex: Some("1".into()),
            postcode: Some("AB1 2CD".into()),
            nhs_no: None,
            chi_no: None,
            hsc_no: None,
            transplants,
        },
        matched: Some(RegistryPatient {
            rr_no,
            uktssa_no: Some(uktssa_no),
            surname: Some("SMITH".into()),
            forename: Some("JOHN".into()),
            date_birth: Some(date(1970, 1, 1)),
            date_death: None,
            sex: Some("1".into()),
            nhs_no: None,
            chi_no: None,
            hsc_no: None,
            postcode: Some("AB1 2CD".into()),
            deleted: false,
        }),
        method: None,
        transition: Transition::NewMatch,
    }
}

fn commit_config() -> LinkageConfig {
    LinkageConfigBuilder::new().with_commit(true).build()
}

#[test]
fn unseen_registration_key_stages_an_insert() {
    let mut store = MemoryStore::new();
    let mut report = AuditReport::new();
    let mut seen = FxHashSet::default();
    let row = linked(700, 42, vec![episode(700, 1)]);

    let outcomes =
        link_patient_transplants(&mut store, &row, &commit_config(), &mut seen, &mut report)
            .unwrap();

    assert_eq!(outcomes, vec![TransplantOutcome::New]);
    assert!(seen.contains("700_1"));
    assert_eq!(report.new_transplants.len(), 1);

    let stored = store.find_transplants("700_1").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].rr_no, Some(42));
}

#[test]
fn changed_clinical_field_stages_an_update_preserving_the_link() {
    let mut store = MemoryStore::new();
    store.add_transplant(StoredTransplant {
        rr_no: Some(42),
        episode: TransplantEpisode {
            transplant_type: Some("DCD".into()),
            ..episode(700, 2)
        },
    });

    let mut report = AuditReport::new();
    let mut seen = FxHashSet::default();
    let row = linked(700, 99, vec![episode(700, 2)]);

    let outcomes =
        link_patient_transplants(&mut store, &row, &commit_config(), &mut seen, &mut report)
            .unwrap();

    assert_eq!(outcomes, vec![TransplantOutcome::Updated]);
    assert_eq!(report.updated_transplants.len(), 1);
    assert!(report
        .transplant_differences
        .iter()
        .any(|diff| diff.field == "transplant_type"));

    let stored = store.find_transplants("700_2").unwrap();
    assert_eq!(stored[0].episode.transplant_type.as_deref(), Some("DBD"));
    // The stored row's own patient link survives the overwrite
    assert_eq!(stored[0].rr_no, Some(42));
}

#[test]
fn identical_episode_is_a_no_op() {
    let mut store = MemoryStore::new();
    store.add_transplant(StoredTransplant {
        rr_no: Some(42),
        episode: episode(700, 1),
    });

    let mut report = AuditReport::new();
    let mut seen = FxHashSet::default();
    let row = linked(700, 42, vec![episode(700, 1)]);

    let outcomes =
        link_patient_transplants(&mut store, &row, &commit_config(), &mut seen, &mut report)
            .unwrap();

    assert_eq!(outcomes, vec![TransplantOutcome::Unchanged]);
    assert_eq!(report.unchanged_transplants, 1);
    assert!(report.new_transplants.is_empty());
    assert!(report.updated_transplants.is_empty());
}

#[test]
fn duplicate_registration_keys_are_logged_and_skipped() {
    let mut store = MemoryStore::new();
    store.add_transplant(StoredTransplant {
        rr_no: Some(1),
        episode: episode(700, 1),
    });
    store.add_transplant(StoredTransplant {
        rr_no: Some(2),
        episode: episode(700, 1),
    });

    let mut report = AuditReport::new();
    let mut seen = FxHashSet::default();
    let row = linked(700, 42, vec![episode(700, 1)]);

    let outcomes =
        link_patient_transplants(&mut store, &row, &commit_config(), &mut seen, &mut report)
            .unwrap();

    assert_eq!(outcomes, vec![TransplantOutcome::Error]);
    assert_eq!(report.integrity_errors, 1);
    // Neither stored row was touched
    let stored = store.find_transplants("700_1").unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].rr_no, Some(1));
}

#[test]
fn dry_run_stages_nothing() {
    let mut store = MemoryStore::new();
    let mut report = AuditReport::new();
    let mut seen = FxHashSet::default();
    let row = linked(700, 42, vec![episode(700, 1)]);

    let config = LinkageConfig::default();
    assert!(!config.commit);
    let outcomes =
        link_patient_transplants(&mut store, &row, &config, &mut seen, &mut report).unwrap();

    // The outcome is still reported, the store stays untouched
    assert_eq!(outcomes, vec![TransplantOutcome::New]);
    assert_eq!(report.new_transplants.len(), 1);
    assert!(store.find_transplants("700_1").unwrap().is_empty());
}

#[test]
fn new_patient_is_staged_and_inserted() {
    let mut store = MemoryStore::new();
    let mut report = AuditReport::new();
    let row = linked(700, 42, Vec::new());

    let clean = stage::stage_patient(&mut store, &row, &commit_config(), &mut report).unwrap();

    assert!(clean);
    assert_eq!(report.new_patients.len(), 1);
    assert_eq!(report.new_patients[0].match_type, "New");
    assert_eq!(store.find_ukt_patients(700).unwrap().len(), 1);
}

#[test]
fn changed_demographics_stage_an_update_with_field_differences() {
    let mut store = MemoryStore::new();
    let row = linked(700, 42, Vec::new());
    let mut stored = UktPatient::from_incoming(&row.incoming, Some(42));
    stored.postcode = Some("ZZ9 9ZZ".into());
    store.add_ukt_patient(stored);

    let mut report = AuditReport::new();
    let clean = stage::stage_patient(&mut store, &row, &commit_config(), &mut report).unwrap();

    assert!(clean);
    assert_eq!(report.updated_patients.len(), 1);
    assert!(report
        .patient_differences
        .iter()
        .any(|diff| diff.field == "postcode" && diff.file_value == "AB1 2CD"));

    let after = &store.find_ukt_patients(700).unwrap()[0];
    assert_eq!(after.postcode.as_deref(), Some("AB1 2CD"));
    assert_eq!(after.rr_no, Some(42));
}

#[test]
fn duplicate_stored_patients_block_the_row() {
    let mut store = MemoryStore::new();
    let row = linked(700, 42, Vec::new());
    store.add_ukt_patient(UktPatient::from_incoming(&row.incoming, None));
    store.add_ukt_patient(UktPatient::from_incoming(&row.incoming, None));

    let mut report = AuditReport::new();
    let clean = stage::stage_patient(&mut store, &row, &commit_config(), &mut report).unwrap();

    assert!(!clean);
    assert_eq!(report.integrity_errors, 1);
}

#[test]
fn missing_rows_are_those_absent_from_the_extract() {
    let mut store = MemoryStore::new();
    let row = linked(700, 42, Vec::new());
    store.add_ukt_patient(UktPatient::from_incoming(&row.incoming, None));
    store.add_ukt_patient(UktPatient {
        uktssa_no: 800,
        ..UktPatient::from_incoming(&row.incoming, None)
    });
    store.add_transplant(StoredTransplant {
        rr_no: None,
        episode: episode(800, 1),
    });

    let mut report = AuditReport::new();
    let seen_patients: FxHashSet<i64> = [700].into_iter().collect();
    let seen_registrations: FxHashSet<String> = FxHashSet::default();

    stage::check_missing_patients(&store, &seen_patients, &mut report).unwrap();
    stage::check_missing_transplants(&store, &seen_registrations, &mut report).unwrap();

    assert_eq!(report.missing_patients.len(), 1);
    assert_eq!(report.missing_patients[0].uktssa_no, 800);
    assert_eq!(report.missing_transplants.len(), 1);
    assert_eq!(report.missing_transplants[0].registration_id, "800_1");
}

#[test]
fn deleted_partition_matches_are_reported() {
    let mut row = linked(700, 42, Vec::new());
    if let Some(matched) = row.matched.as_mut() {
        matched.deleted = true;
    }

    let mut report = AuditReport::new();
    stage::check_deleted_patients(&[row], &mut report);

    assert_eq!(report.deleted_patients.len(), 1);
    assert_eq!(report.deleted_patients[0].rr_no, 42);
}
