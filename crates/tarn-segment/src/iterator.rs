//! Forward iteration over segment entries.

use tarn_common::{GatherBuffer, Result, TarnError};

use crate::certificate::Certificate;
use crate::entry::EntryType;
use crate::segment::Segment;

/// The entry currently under the cursor.
#[derive(Debug, Clone, Copy)]
struct CurrentEntry {
    entry_type: EntryType,
    length: u32,
    entry_offset: u32,
    payload_offset: u32,
}

/// A forward, single-pass cursor over the entries of a segment prefix.
///
/// Constructed with a certificate, the iterator verifies the prefix before
/// yielding anything and refuses to exist when verification fails; replicas
/// that receive corrupted segment bytes discard them or re-fetch rather
/// than iterate. Without a certificate the iterator walks to the segment's
/// appended length, which is only sound for the segment's own writer.
///
/// The iterator borrows the segment and never mutates it.
#[derive(Debug)]
pub struct SegmentIterator<'a> {
    segment: &'a Segment,
    /// One past the last byte this iterator may observe.
    limit: u32,
    /// Offset of the next unparsed entry.
    offset: u32,
    current: Option<CurrentEntry>,
}

impl<'a> SegmentIterator<'a> {
    /// Iterates everything appended so far, trusting the segment.
    pub fn new(segment: &'a Segment) -> Result<Self> {
        Self::bounded(segment, segment.appended_length())
    }

    /// Iterates the prefix witnessed by `certificate`, verifying metadata
    /// integrity first. Fails with
    /// [`CertificateMismatch`](TarnError::CertificateMismatch) when the
    /// segment does not match the certificate.
    pub fn with_certificate(segment: &'a Segment, certificate: &Certificate) -> Result<Self> {
        if !segment.check_metadata_integrity(certificate) {
            return Err(TarnError::CertificateMismatch {
                certificate: certificate.to_string(),
            });
        }
        Self::bounded(segment, certificate.segment_length)
    }

    fn bounded(segment: &'a Segment, limit: u32) -> Result<Self> {
        let mut iterator = SegmentIterator {
            segment,
            limit,
            offset: 0,
            current: None,
        };
        iterator.load()?;
        Ok(iterator)
    }

    /// Parses the entry at the cursor, or clears `current` at the limit.
    fn load(&mut self) -> Result<()> {
        if self.offset >= self.limit {
            self.current = None;
            return Ok(());
        }
        let (header, length, payload_offset) = self.segment.parse_entry(self.offset)?;
        let entry_type = header.entry_type()?;
        self.current = Some(CurrentEntry {
            entry_type,
            length,
            entry_offset: self.offset,
            payload_offset,
        });
        Ok(())
    }

    /// Returns true once the cursor has passed the last entry.
    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }

    /// Moves the cursor to the next entry. A no-op once done.
    pub fn advance(&mut self) -> Result<()> {
        if let Some(current) = self.current {
            self.offset = current.payload_offset.saturating_add(current.length);
            self.load()?;
        }
        Ok(())
    }

    /// Type of the current entry.
    pub fn entry_type(&self) -> Option<EntryType> {
        self.current.map(|current| current.entry_type)
    }

    /// Payload length of the current entry.
    pub fn entry_length(&self) -> Option<u32> {
        self.current.map(|current| current.length)
    }

    /// Logical offset of the current entry's header byte.
    pub fn entry_offset(&self) -> Option<u32> {
        self.current.map(|current| current.entry_offset)
    }

    /// Appends a view of the current entry's payload to `buffer`. Returns
    /// the number of payload bytes appended; zero once done.
    pub fn append_to_buffer(&self, buffer: &mut GatherBuffer) -> u32 {
        match self.current {
            Some(current) => {
                self.segment
                    .append_to_buffer(buffer, current.payload_offset, current.length);
                current.length
            }
            None => 0,
        }
    }

    /// Returns the longest contiguous run of the current entry's payload,
    /// starting at its first byte.
    pub fn contiguous_bytes(&self) -> Option<&[u8]> {
        let current = self.current?;
        let run = self.segment.peek(current.payload_offset)?;
        Some(&run[..run.len().min(current.length as usize)])
    }
}
