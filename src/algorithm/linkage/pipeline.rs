//! Pipeline driver: generation, aggregation, resolution,
//! reconciliation and transition classification.

use std::time::Instant;

use itertools::Itertools;
use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::algorithm::linkage::{aggregate, candidates, reconcile, resolve, transition};
use crate::config::LinkageConfig;
use crate::error::Result;
use crate::model::{IncomingPatient, LinkedPatient, Transition};
use crate::store::RegistrySnapshot;
use crate::utils::progress;

/// Run the full linkage over one extract against one registry snapshot
///
/// Output rows come back in extract order, one per incoming record,
/// matched or not.
pub fn run_linkage(
    incoming: &[IncomingPatient],
    snapshot: &RegistrySnapshot,
    config: &LinkageConfig,
) -> Result<Vec<LinkedPatient>> {
    let start = Instant::now();
    info!(
        "matching {} extract records against {} registry records ({} live, {} deleted)",
        incoming.len(),
        snapshot.len(),
        snapshot.live().len(),
        snapshot.deleted().len()
    );

    let stages = candidates::generate(incoming, snapshot, config);
    for (method, stage) in &stages {
        debug!("{}: {} candidates", method.as_str(), stage.len());
    }

    let stage_outputs: Vec<_> = stages.into_iter().map(|(_, stage)| stage).collect();
    let aggregated = aggregate::aggregate(&stage_outputs);
    info!("{} candidate pairs after aggregation", aggregated.len());

    let resolved = resolve::resolve(&aggregated, incoming, snapshot);
    let resolved = reconcile::reconcile(resolved, &aggregated, incoming, snapshot);

    let winners: FxHashMap<usize, _> = resolved
        .into_iter()
        .map(|candidate| (candidate.incoming, candidate))
        .collect();

    let pb = progress::create_main_progress_bar(incoming.len() as u64, Some("Linking patients"));
    let mut linked = Vec::with_capacity(incoming.len());
    let mut matched_count = 0usize;
    let mut transition_counts: FxHashMap<Transition, usize> = FxHashMap::default();

    for (index, patient) in incoming.iter().enumerate() {
        let winner = winners.get(&index);
        let matched = winner.map(|candidate| snapshot.patient(candidate.registry).clone());
        let current = matched.as_ref().map(|registry| registry.rr_no);

        let transition = transition::classify(patient.prior_rr_no, current);
        transition::log_transition(transition, patient.uktssa_no, patient.prior_rr_no, current);
        *transition_counts.entry(transition).or_default() += 1;

        if matched.is_some() {
            matched_count += 1;
        }

        linked.push(LinkedPatient {
            incoming: patient.clone(),
            matched,
            method: winner.map(|candidate| candidate.method),
            transition,
        });
        pb.inc(1);
    }
    progress::finish_progress_bar(&pb, Some("Linkage complete"));

    for (transition, count) in transition_counts
        .iter()
        .sorted_by_key(|(transition, _)| transition.as_str())
    {
        info!("{}: {count}", transition.as_str());
    }
    info!(
        "linkage finished in {:.2?}: {matched_count} matched, {} unmatched",
        start.elapsed(),
        incoming.len() - matched_count
    );

    Ok(linked)
}
