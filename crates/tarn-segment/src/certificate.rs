//! Segment certificates.

use crate::constants::CERTIFICATE_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A witness for a segment prefix: how many bytes are valid and a checksum
/// guarding the metadata within them.
///
/// Segments emit certificates from [`Segment::certificate`] and verify them
/// in [`Segment::check_metadata_integrity`]; the replication layer ships
/// certificates alongside segment bytes so that a backup only trusts the
/// prefix the master has committed. Because the checksum also covers the
/// `segment_length` field itself, the declared length cannot be altered
/// without detection.
///
/// Everything outside the segment and its iterator treats certificates as
/// opaque eight-byte values and transports them byte-for-byte.
///
/// [`Segment::certificate`]: crate::Segment::certificate
/// [`Segment::check_metadata_integrity`]: crate::Segment::check_metadata_integrity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Bytes of the associated segment this certificate covers.
    pub(crate) segment_length: u32,
    /// CRC32C over every entry header and length field within the covered
    /// prefix, extended with `segment_length` itself.
    pub(crate) checksum: u32,
}

impl Certificate {
    pub(crate) fn new(segment_length: u32, checksum: u32) -> Self {
        Self {
            segment_length,
            checksum,
        }
    }

    /// Packs the certificate into its eight-byte wire form.
    pub fn to_bytes(&self) -> [u8; CERTIFICATE_SIZE] {
        let mut raw = [0u8; CERTIFICATE_SIZE];
        raw[0..4].copy_from_slice(&self.segment_length.to_le_bytes());
        raw[4..8].copy_from_slice(&self.checksum.to_le_bytes());
        raw
    }

    /// Unpacks a certificate from its eight-byte wire form.
    pub fn from_bytes(raw: &[u8; CERTIFICATE_SIZE]) -> Self {
        Self {
            segment_length: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            checksum: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        }
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, 0x{:08x}>", self.segment_length, self.checksum)
    }
}
