//! Value records flowing through the linkage pipeline.
//!
//! All types here are plain immutable values. Updates are expressed as
//! pure merge functions that produce a new copy, so the matching logic
//! never mutates shared state.

pub mod patient;
pub mod transition;
pub mod transplant;

pub use patient::{IncomingPatient, LinkedPatient, RegistryPatient, UktPatient};
pub use transition::{MatchMethod, Transition};
pub use transplant::{StoredTransplant, TransplantEpisode};
