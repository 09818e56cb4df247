//! Matching algorithms: patient linkage and transplant linking.

pub mod linkage;
pub mod transplant;
