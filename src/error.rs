//! Error types for bioline

use thiserror::Error;

/// Result type alias for bioline operations
pub type Result<T> = std::result::Result<T, BiolineError>;

/// Error types that can occur in bioline
///
/// Structural problems inside a single data line (too few fields,
/// non-numeric coordinates) are not represented here: the streams skip
/// such lines and count them instead. Only resource acquisition and
/// query construction can fail.
#[derive(Debug, Error)]
pub enum BiolineError {
    /// I/O error (missing file at open, read failure mid-pass)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid genomic region bounds (start > end)
    #[error("Invalid region: start {start} > end {end}")]
    InvalidRegion {
        /// Start position (1-based, inclusive)
        start: u64,
        /// End position (1-based, inclusive)
        end: u64,
    },
}
