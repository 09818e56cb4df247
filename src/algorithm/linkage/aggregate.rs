//! Aggregation of generator outputs into one deduplicated stream.

use rustc_hash::FxHashSet;

use crate::algorithm::linkage::types::MatchCandidate;

/// Union the stage outputs in order, dropping exact duplicate pairs
///
/// The first occurrence of a pair wins, so a pair proposed by an
/// earlier generator keeps that generator's method tag. Running the
/// output through again changes nothing.
#[must_use]
pub fn aggregate(stages: &[Vec<MatchCandidate>]) -> Vec<MatchCandidate> {
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut merged = Vec::new();

    for stage in stages {
        for &candidate in stage {
            if seen.insert((candidate.incoming, candidate.registry)) {
                merged.push(candidate);
            }
        }
    }

    merged
}
