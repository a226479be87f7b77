//! Error types for the benchmark model

use thiserror::Error;

/// A variant name that does not describe any benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown benchmark variant '{name}' (expected one of: {expected})")]
pub struct VariantParseError {
    /// Name as given by the caller
    pub name: String,
    /// Comma-separated list of accepted names
    pub expected: String,
}

impl VariantParseError {
    /// Create a parse error listing every accepted name.
    pub fn unknown(name: impl Into<String>) -> Self {
        let expected = crate::Variant::all()
            .iter()
            .map(|v| v.name())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            name: name.into(),
            expected,
        }
    }
}

/// Buffers that cannot be packed into, or unpacked from, interleaved records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The record buffer does not divide evenly into one field per stream
    #[error("{records} record elements cannot be split across {streams} streams")]
    WidthMismatch {
        /// Elements in the record buffer
        records: usize,
        /// Streams supplied, i.e. the record width checked
        streams: usize,
    },

    /// A stream is shorter or longer than the record buffer implies
    #[error("stream {index} has {len} elements, records hold {expected}")]
    LengthMismatch {
        /// Zero-based stream position
        index: usize,
        /// Elements in that stream
        len: usize,
        /// Elements implied by the record buffer
        expected: usize,
    },
}
