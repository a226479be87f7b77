//! Error types for harness runs

use offload_driver::OffloadError;
use offload_model::{LayoutError, VariantParseError};
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors that stop a benchmark run
///
/// Verification mismatches are not errors; they are reported per index.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Variant name did not resolve
    #[error(transparent)]
    Variant(#[from] VariantParseError),

    /// Run parameters are unusable
    #[error("Invalid configuration: {reason}")]
    Config {
        /// Reason for failure
        reason: String,
    },

    /// Copy, dispatch or allocation failed on the device
    #[error("Backend error: {source}")]
    Backend {
        /// Underlying driver error
        #[from]
        source: OffloadError,
    },

    /// Host re-packing between arrays and records failed
    #[error("Layout error: {source}")]
    Layout {
        /// Underlying layout error
        #[from]
        source: LayoutError,
    },

    /// Trial index beyond the timing table
    #[error("Iteration {iteration} outside timing table of {capacity}")]
    IterationOutOfRange {
        /// Requested iteration
        iteration: usize,
        /// Table size
        capacity: usize,
    },
}

impl BenchError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
