//! Import-side staging: compare linked rows against the store and
//! record every outcome in the audit report.

use log::error;
use rustc_hash::FxHashSet;

use crate::config::LinkageConfig;
use crate::error::Result;
use crate::model::{LinkedPatient, UktPatient};
use crate::report::rows::{
    self, DeletedPatientRow, MissingPatientRow, MissingTransplantRow, PatientFieldDifference,
    PatientRow,
};
use crate::report::AuditReport;
use crate::store::RegistryStore;

/// Stage one linked patient against the store
///
/// # Returns
/// `true` when the row is in a clean state and its transplants should
/// be linked too; `false` when an integrity problem made the row
/// unsafe to touch
pub fn stage_patient<S: RegistryStore>(
    store: &mut S,
    linked: &LinkedPatient,
    config: &LinkageConfig,
    report: &mut AuditReport,
) -> Result<bool> {
    let incoming = UktPatient::from_incoming(&linked.incoming, linked.rr_no());
    let existing = store.find_ukt_patients(incoming.uktssa_no)?;

    match existing.as_slice() {
        [] => {
            report
                .new_patients
                .push(PatientRow::new("New", &incoming, None));
            if config.commit {
                store.insert_ukt_patient(incoming)?;
            }
            Ok(true)
        }
        [stored] => {
            let differences = stored.diff_fields(&incoming);
            if differences.is_empty() && stored.rr_no == incoming.rr_no.or(stored.rr_no) {
                report.unchanged_patients += 1;
                return Ok(true);
            }

            for &field in &differences {
                report.patient_differences.push(PatientFieldDifference {
                    uktssa_no: incoming.uktssa_no,
                    field,
                    file_value: rows::patient_field_value(&incoming, field),
                    previous_value: rows::patient_field_value(stored, field),
                });
            }
            report
                .updated_patients
                .push(PatientRow::new("Update", &incoming, Some(stored)));
            if config.commit {
                store.update_ukt_patient(stored.merged_with(&incoming))?;
            }
            Ok(true)
        }
        rows => {
            error!(
                "{} stored rows for patient {}, expected at most one; skipping",
                rows.len(),
                incoming.uktssa_no
            );
            report.integrity_errors += 1;
            Ok(false)
        }
    }
}

/// Stored patients absent from this extract
pub fn check_missing_patients<S: RegistryStore>(
    store: &S,
    seen: &FxHashSet<i64>,
    report: &mut AuditReport,
) -> Result<()> {
    for uktssa_no in store.list_ukt_patient_ids()? {
        if !seen.contains(&uktssa_no) {
            report.missing_patients.push(MissingPatientRow { uktssa_no });
        }
    }
    Ok(())
}

/// Stored transplants absent from this extract
pub fn check_missing_transplants<S: RegistryStore>(
    store: &S,
    seen: &FxHashSet<String>,
    report: &mut AuditReport,
) -> Result<()> {
    for registration_id in store.list_registration_ids()? {
        if !seen.contains(&registration_id) {
            report
                .missing_transplants
                .push(MissingTransplantRow { registration_id });
        }
    }
    Ok(())
}

/// Extract rows whose resolved match sits in the deleted partition
pub fn check_deleted_patients(linked: &[LinkedPatient], report: &mut AuditReport) {
    for row in linked {
        if let Some(matched) = &row.matched {
            if matched.deleted {
                report
                    .deleted_patients
                    .push(DeletedPatientRow::new(row.incoming.uktssa_no, matched));
            }
        }
    }
}
