//! Transition classification against the prior stored link.

use log::info;

use crate::model::Transition;

/// Classify this run's outcome against the prior stored registry id
#[must_use]
pub const fn classify(prior: Option<i64>, current: Option<i64>) -> Transition {
    match (prior, current) {
        (None, None) => Transition::NoPriorNoMatch,
        (None, Some(_)) => Transition::NewMatch,
        (Some(_), None) => Transition::UsedToMatch,
        (Some(p), Some(c)) => {
            if p == c {
                Transition::SameMatch
            } else {
                Transition::DifferentMatch
            }
        }
    }
}

/// Log a transition worth an operator's attention
pub fn log_transition(
    transition: Transition,
    uktssa_no: i64,
    prior: Option<i64>,
    current: Option<i64>,
) {
    match transition {
        Transition::NoPriorNoMatch => {}
        Transition::NewMatch => {
            if let Some(rr_no) = current {
                info!("NEW_MATCH uktssa_no={uktssa_no} rr_no={rr_no}");
            }
        }
        Transition::UsedToMatch => {
            if let Some(rr_no) = prior {
                info!("USED_TO_MATCH uktssa_no={uktssa_no} previous rr_no={rr_no}");
            }
        }
        Transition::SameMatch => {
            if let Some(rr_no) = current {
                info!("SAME_MATCH uktssa_no={uktssa_no} rr_no={rr_no}");
            }
        }
        Transition::DifferentMatch => {
            info!(
                "DIFFERENT_MATCH uktssa_no={uktssa_no} previous rr_no={:?} now rr_no={:?}",
                prior, current
            );
        }
    }
}
