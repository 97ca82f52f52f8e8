//! Entry framing: types, the one-byte header, and the length codec.

use serde::{Deserialize, Serialize};
use tarn_common::TarnError;

/// Types of entries the log appends to segments.
///
/// Ordinals must stay below 64 so they fit the header's six type bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntryType {
    /// Invalid/padding entry.
    Invalid = 0,
    /// Self-identifying header the log writes first into every segment.
    SegmentHeader = 1,
    /// A live key-value object.
    Object = 2,
    /// A tombstone marking a deleted object.
    Tombstone = 3,
    /// Digest of the segments comprising the log at a point in time.
    LogDigest = 4,
    /// Cluster-wide safe version marker.
    SafeVersion = 5,
    /// Per-table statistics snapshot.
    TableStats = 6,
    /// A linearizable RPC result retained for at-most-once semantics.
    RpcResult = 7,
}

impl TryFrom<u8> for EntryType {
    type Error = TarnError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EntryType::Invalid),
            1 => Ok(EntryType::SegmentHeader),
            2 => Ok(EntryType::Object),
            3 => Ok(EntryType::Tombstone),
            4 => Ok(EntryType::LogDigest),
            5 => Ok(EntryType::SafeVersion),
            6 => Ok(EntryType::TableStats),
            7 => Ok(EntryType::RpcResult),
            _ => Err(TarnError::InvalidEntryType(value)),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntryType::Invalid => "invalid",
            EntryType::SegmentHeader => "segment_header",
            EntryType::Object => "object",
            EntryType::Tombstone => "tombstone",
            EntryType::LogDigest => "log_digest",
            EntryType::SafeVersion => "safe_version",
            EntryType::TableStats => "table_stats",
            EntryType::RpcResult => "rpc_result",
        };
        write!(f, "{}", name)
    }
}

/// The one-byte header preceding every entry.
///
/// Wire layout:
///
/// ```text
///   bit 7 6 | 5 4 3 2 1 0
///       +---+------------+
///       | w |    type    |    w = length field width - 1
///       +---+------------+
/// ```
///
/// The header is followed by a little-endian length field of `w + 1` bytes,
/// then by the payload itself. Keeping the length field minimal matters:
/// most entries are small objects, and a fixed four-byte length would waste
/// three bytes on nearly every one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader(u8);

impl EntryHeader {
    /// Builds the header for an entry of the given type and payload length.
    pub fn new(entry_type: EntryType, length: u32) -> Self {
        let ordinal = entry_type as u8;
        debug_assert!((ordinal & !0x3f) == 0);
        EntryHeader(ordinal | ((length_bytes_for(length) - 1) << 6))
    }

    /// Reinterprets a raw byte read back out of a segment.
    pub fn from_byte(byte: u8) -> Self {
        EntryHeader(byte)
    }

    /// Returns the wire form of this header.
    pub fn as_byte(&self) -> u8 {
        self.0
    }

    /// Returns the entry type, or an error for ordinals no type claims.
    pub fn entry_type(&self) -> Result<EntryType, TarnError> {
        EntryType::try_from(self.type_ordinal())
    }

    /// Returns the raw six-bit type ordinal.
    pub fn type_ordinal(&self) -> u8 {
        self.0 & 0x3f
    }

    /// Returns the width in bytes (1-4) of the length field that follows.
    pub fn length_bytes(&self) -> u8 {
        (self.0 >> 6) + 1
    }
}

/// Smallest number of little-endian bytes that can hold `length`.
pub(crate) fn length_bytes_for(length: u32) -> u8 {
    if length < 1 << 8 {
        1
    } else if length < 1 << 16 {
        2
    } else if length < 1 << 24 {
        3
    } else {
        4
    }
}

/// Decodes a 1-4 byte little-endian length field.
pub(crate) fn decode_length(field: &[u8]) -> u32 {
    debug_assert!((1..=4).contains(&field.len()));
    let mut raw = [0u8; 4];
    raw[..field.len()].copy_from_slice(field);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_roundtrip_all_ordinals() {
        for ordinal in 0u8..=7 {
            let entry_type = EntryType::try_from(ordinal).unwrap();
            assert_eq!(entry_type as u8, ordinal);
        }
    }

    #[test]
    fn test_entry_type_invalid_ordinals() {
        for ordinal in [8u8, 42, 63, 64, 255] {
            assert!(EntryType::try_from(ordinal).is_err());
        }
    }

    #[test]
    fn test_entry_type_invalid_error_carries_ordinal() {
        let err = EntryType::try_from(42u8).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_entry_type_display() {
        assert_eq!(EntryType::Object.to_string(), "object");
        assert_eq!(EntryType::Tombstone.to_string(), "tombstone");
        assert_eq!(EntryType::SafeVersion.to_string(), "safe_version");
    }

    #[test]
    fn test_header_is_one_byte() {
        assert_eq!(std::mem::size_of::<EntryHeader>(), 1);
    }

    #[test]
    fn test_header_packs_type_in_low_bits() {
        let header = EntryHeader::new(EntryType::RpcResult, 10);
        assert_eq!(header.as_byte() & 0x3f, 7);
        assert_eq!(header.entry_type().unwrap(), EntryType::RpcResult);
    }

    #[test]
    fn test_length_bytes_boundaries() {
        // One byte up to 255, two up to 65535, three up to 16777215.
        let cases = [
            (0u32, 1u8),
            (1, 1),
            (255, 1),
            (256, 2),
            (65_535, 2),
            (65_536, 3),
            (16_777_215, 3),
            (16_777_216, 4),
            (u32::MAX, 4),
        ];
        for (length, expected) in cases {
            assert_eq!(length_bytes_for(length), expected, "length {}", length);
            let header = EntryHeader::new(EntryType::Object, length);
            assert_eq!(header.length_bytes(), expected, "length {}", length);
        }
    }

    #[test]
    fn test_header_width_in_high_bits() {
        let header = EntryHeader::new(EntryType::Object, 65_536);
        assert_eq!(header.as_byte() >> 6, 2); // three-byte field
    }

    #[test]
    fn test_header_byte_roundtrip() {
        let header = EntryHeader::new(EntryType::Tombstone, 300);
        let restored = EntryHeader::from_byte(header.as_byte());
        assert_eq!(restored, header);
        assert_eq!(restored.entry_type().unwrap(), EntryType::Tombstone);
        assert_eq!(restored.length_bytes(), 2);
    }

    #[test]
    fn test_header_unknown_ordinal_surfaces_error() {
        let header = EntryHeader::from_byte(0x3f); // ordinal 63, one-byte length
        assert_eq!(header.type_ordinal(), 63);
        assert_eq!(header.length_bytes(), 1);
        assert!(header.entry_type().is_err());
    }

    #[test]
    fn test_decode_length_all_widths() {
        assert_eq!(decode_length(&[0x2A]), 42);
        assert_eq!(decode_length(&[0x00, 0x01]), 256);
        assert_eq!(decode_length(&[0xFF, 0xFF]), 65_535);
        assert_eq!(decode_length(&[0x00, 0x00, 0x01]), 65_536);
        assert_eq!(decode_length(&[0xFF, 0xFF, 0xFF, 0xFF]), u32::MAX);
    }

    #[test]
    fn test_decode_length_matches_encoding() {
        for length in [0u32, 1, 255, 256, 65_535, 65_536, 16_777_216, u32::MAX] {
            let width = length_bytes_for(length) as usize;
            let raw = length.to_le_bytes();
            assert_eq!(decode_length(&raw[..width]), length);
        }
    }

    #[test]
    fn test_entry_type_serde_roundtrip() {
        for entry_type in [EntryType::Object, EntryType::Tombstone, EntryType::LogDigest] {
            let json = serde_json::to_string(&entry_type).unwrap();
            let back: EntryType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, entry_type);
        }
    }
}
