//! Transplant linking by composite registration key.
//!
//! Runs only for extract rows whose patient side is in a clean state.
//! Each episode is looked up by its `{external id}_{slot}` key: no
//! stored row means a new transplant, one stored row is compared field
//! by field, and more than one is an integrity violation that gets
//! logged and skipped rather than guessed at.

use log::error;
use rustc_hash::FxHashSet;

use crate::config::LinkageConfig;
use crate::error::Result;
use crate::model::{LinkedPatient, StoredTransplant};
use crate::report::rows::{self, TransplantFieldDifference, TransplantRow};
use crate::report::AuditReport;
use crate::store::RegistryStore;

/// Outcome of linking one transplant episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransplantOutcome {
    New,
    Updated,
    Unchanged,
    /// Duplicate registration key in the store; the episode was skipped
    Error,
}

/// Link every episode of one patient, recording each outcome
///
/// Registration keys seen are added to `seen` for the missing-row
/// check at the end of the run.
pub fn link_patient_transplants<S: RegistryStore>(
    store: &mut S,
    linked: &LinkedPatient,
    config: &LinkageConfig,
    seen: &mut FxHashSet<String>,
    report: &mut AuditReport,
) -> Result<Vec<TransplantOutcome>> {
    let mut outcomes = Vec::with_capacity(linked.incoming.transplants.len());

    for episode in &linked.incoming.transplants {
        seen.insert(episode.registration_id.clone());
        let stored = store.find_transplants(&episode.registration_id)?;

        let outcome = match stored.as_slice() {
            [] => {
                report
                    .new_transplants
                    .push(TransplantRow::new("New", episode, linked.rr_no()));
                if config.commit {
                    store.insert_transplant(StoredTransplant {
                        rr_no: linked.rr_no(),
                        episode: episode.clone(),
                    })?;
                }
                TransplantOutcome::New
            }
            [existing] => {
                let differences = existing.episode.diff_fields(episode);
                if differences.is_empty() {
                    report.unchanged_transplants += 1;
                    TransplantOutcome::Unchanged
                } else {
                    for &field in &differences {
                        report.transplant_differences.push(TransplantFieldDifference {
                            uktssa_no: episode.uktssa_no,
                            registration_id: episode.registration_id.clone(),
                            field,
                            file_value: rows::transplant_field_value(episode, field),
                            previous_value: rows::transplant_field_value(
                                &existing.episode,
                                field,
                            ),
                        });
                    }
                    report
                        .updated_transplants
                        .push(TransplantRow::new("Update", episode, existing.rr_no));
                    if config.commit {
                        store.update_transplant(existing.merged_with(episode))?;
                    }
                    TransplantOutcome::Updated
                }
            }
            rows => {
                error!(
                    "{} stored rows for transplant registration {}, expected at most one; skipping",
                    rows.len(),
                    episode.registration_id
                );
                report.integrity_errors += 1;
                TransplantOutcome::Error
            }
        };

        outcomes.push(outcome);
    }

    Ok(outcomes)
}
