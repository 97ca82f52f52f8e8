//! Segment constants for entry framing and sizing.

/// Default capacity of a self-allocated segment (8 MB).
#[cfg(not(feature = "small-segments"))]
pub const DEFAULT_SEGMENT_SIZE: u32 = 8 * 1024 * 1024;

/// Reduced default capacity for memory-constrained diagnostic builds (1 MB).
#[cfg(feature = "small-segments")]
pub const DEFAULT_SEGMENT_SIZE: u32 = 1024 * 1024;

/// Default seglet size (64 KB).
pub const DEFAULT_SEGLET_SIZE: u32 = 64 * 1024;

/// Number of distinct entry types the one-byte header can carry.
/// The header keeps six bits for the type ordinal.
pub const MAX_ENTRY_TYPES: usize = 64;

/// Size of the entry header on the wire.
pub const ENTRY_HEADER_SIZE: usize = 1;

/// Widest supported entry length field, in bytes.
pub const MAX_LENGTH_BYTES: usize = 4;

/// Size of a certificate on the wire.
pub const CERTIFICATE_SIZE: usize = 8;
