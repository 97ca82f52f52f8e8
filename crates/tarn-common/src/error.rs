//! Error types for TarnKV.

use thiserror::Error;

/// Result type alias using TarnError.
pub type Result<T> = std::result::Result<T, TarnError>;

/// Errors that can occur in TarnKV log operations.
#[derive(Debug, Error)]
pub enum TarnError {
    // Segment errors
    #[error("Segment closed, no further appends accepted")]
    SegmentClosed,

    #[error("Segment full: {needed} bytes needed, {available} available")]
    SegmentFull { needed: u32, available: u32 },

    #[error("Segment corrupted at offset {offset}: {reason}")]
    SegmentCorrupted { offset: u32, reason: String },

    #[error("Certificate check failed for {certificate}")]
    CertificateMismatch { certificate: String },

    #[error("Invalid entry type ordinal: {0}")]
    InvalidEntryType(u8),

    // Seglet pool errors
    #[error("Seglet pool exhausted: {requested} seglets requested, {available} free")]
    SegletPoolExhausted { requested: usize, available: usize },

    // Configuration errors
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}
