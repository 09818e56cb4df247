//! Deletion reconciliation: a live match always beats a deleted one.

use log::info;

use crate::algorithm::linkage::resolve;
use crate::algorithm::linkage::types::MatchCandidate;
use crate::model::IncomingPatient;
use crate::store::RegistrySnapshot;

/// Replace deleted-sourced winners with their best live alternative
///
/// A patient who resolves against the deleted partition but also has
/// live candidates should not raise a deletion alert; the live match
/// wins. Winners whose only candidates are deleted-sourced stay, and
/// surface downstream as deleted-patient hits. The output never holds
/// both a live-sourced and a deleted-sourced row for the same incoming
/// record, since each record keeps exactly one winner.
#[must_use]
pub fn reconcile(
    resolved: Vec<MatchCandidate>,
    aggregated: &[MatchCandidate],
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
) -> Vec<MatchCandidate> {
    resolved
        .into_iter()
        .map(|winner| {
            if !snapshot.is_deleted(winner.registry) {
                return winner;
            }

            let live: Vec<MatchCandidate> = aggregated
                .iter()
                .filter(|candidate| {
                    candidate.incoming == winner.incoming && !snapshot.is_deleted(candidate.registry)
                })
                .copied()
                .collect();

            if live.is_empty() {
                return winner;
            }

            let replacement = resolve::best_of(&live, incoming, snapshot);
            info!(
                "live registry record {} supersedes deleted record {} for {}",
                snapshot.patient(replacement.registry).rr_no,
                snapshot.patient(winner.registry).rr_no,
                incoming[winner.incoming].uktssa_no
            );
            replacement
        })
        .collect()
}
