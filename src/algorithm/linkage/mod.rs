//! The patient linkage core.
//!
//! Four stages, run in order over a stable registry snapshot:
//! candidate generation (one generator per match method), aggregation
//! with exact-pair dedup, conflict resolution by additive scoring, and
//! deletion reconciliation. The pipeline module drives them and
//! classifies each row's transition against its prior stored link.

pub mod aggregate;
pub mod candidates;
pub mod fuzzy;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
pub mod transition;
pub mod types;

pub use pipeline::run_linkage;
pub use types::MatchCandidate;
