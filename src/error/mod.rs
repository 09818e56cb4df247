//! Error handling for the linkage pipeline.

/// Specialized error type for linkage operations
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading or writing CSV data
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Extract layout does not match the expected column table
    #[error("Schema error: {0}")]
    Schema(String),

    /// Input value failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored data violates a structural invariant
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Error from the registry store backend
    #[error("Store error: {0}")]
    Store(String),
}

/// Alias for Result with `LinkError`
pub type Result<T> = std::result::Result<T, LinkError>;
