//! A Rust library for linking NHSBT/UKT transplant extract records
//! against the renal registry, with conflict resolution, deletion
//! reconciliation, transplant linking and audit reporting.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod extract;
pub mod identifier;
pub mod model;
pub mod parse;
pub mod report;
pub mod schema;
pub mod store;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{LinkageConfig, LinkageConfigBuilder};
pub use error::{LinkError, Result};
pub use model::{
    IncomingPatient, LinkedPatient, MatchMethod, RegistryPatient, StoredTransplant, Transition,
    TransplantEpisode, UktPatient,
};
pub use store::{MemoryStore, Partition, RegistrySnapshot, RegistryStore};

// Pipeline entry points
pub use algorithm::linkage::run_linkage;
pub use algorithm::transplant::{link_patient_transplants, TransplantOutcome};

// Loaders
pub use extract::{load_extract, load_paeds, load_registry, ExtractStats};

// Reporting
pub use report::{write_matched_output, AuditReport};
