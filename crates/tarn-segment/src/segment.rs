//! The append-only segment container.

use bytes::Bytes;
use std::fmt;
use tarn_common::{GatherBuffer, Result, TarnError};
use tarn_seglet::Seglet;

use crate::certificate::Certificate;
use crate::checksum::Crc32c;
use crate::constants::{DEFAULT_SEGMENT_SIZE, MAX_ENTRY_TYPES};
use crate::entry::{decode_length, length_bytes_for, EntryHeader, EntryType};

/// Backing memory for a segment.
enum Storage {
    /// One self-allocated block, freed when the segment drops.
    Owned(Box<[u8]>),
    /// Seglets borrowed from a pool, returned on drop or reclamation.
    Seglets(Vec<Seglet>),
    /// Read-only view over an externally owned flat buffer.
    View(Bytes),
}

impl Storage {
    fn block_count(&self) -> usize {
        match self {
            Storage::Owned(_) | Storage::View(_) => 1,
            Storage::Seglets(seglets) => seglets.len(),
        }
    }

    fn block(&self, index: usize) -> &[u8] {
        match self {
            Storage::Owned(block) => {
                debug_assert_eq!(index, 0);
                block
            }
            Storage::Seglets(seglets) => seglets[index].block(),
            Storage::View(bytes) => {
                debug_assert_eq!(index, 0);
                bytes
            }
        }
    }

    /// Returns `None` for read-only storage.
    fn block_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        match self {
            Storage::Owned(block) => {
                debug_assert_eq!(index, 0);
                Some(block)
            }
            Storage::Seglets(seglets) => Some(seglets[index].block_mut()),
            Storage::View(_) => None,
        }
    }
}

/// A bounded, append-only container of typed, length-prefixed entries.
///
/// Entries are framed as a one-byte [`EntryHeader`], a minimal 1-4 byte
/// little-endian length field, and the payload. The header and length bytes
/// of every entry feed a running CRC32C; payload bytes do not. A
/// [`Certificate`] captures the current length together with that checksum,
/// witnessing the prefix so replicas and recovery can verify it before
/// iterating.
///
/// A segment's bytes may span several seglets, so an entry is not
/// guaranteed to be contiguous in memory; readers use [`peek`](Self::peek),
/// [`copy_out`](Self::copy_out), or gather views.
///
/// Segments have a single writer. Appends are totally ordered, offsets are
/// strictly increasing, and a written prefix never changes, which is what
/// makes publishing a certificate sufficient for cross-thread readers of a
/// shared segment.
pub struct Segment {
    storage: Storage,
    /// Size in bytes of each backing block.
    seglet_size: u32,
    /// `log2(seglet_size)` when the segment spans more than one seglet,
    /// else 0, which selects the single-block path in `locate`.
    seglet_size_shift: u32,
    /// Offset of the next free byte.
    head: u32,
    /// Once set, every append fails. Permanent.
    closed: bool,
    /// Running CRC32C over entry metadata bytes only.
    checksum: Crc32c,
    /// Per-type count of appended entries. Monotonic.
    entry_counts: [u32; MAX_ENTRY_TYPES],
    /// Per-type total of appended payload bytes. Monotonic.
    entry_lengths: [u32; MAX_ENTRY_TYPES],
}

impl Segment {
    /// Creates a segment over one self-allocated block of
    /// [`DEFAULT_SEGMENT_SIZE`] bytes.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SEGMENT_SIZE)
    }

    /// Creates a segment over one self-allocated block of `capacity` bytes.
    pub fn with_capacity(capacity: u32) -> Self {
        assert!(capacity > 0, "segment capacity must be non-zero");
        Self::from_storage(
            Storage::Owned(vec![0u8; capacity as usize].into_boxed_slice()),
            capacity,
            0,
            false,
        )
    }

    /// Creates a segment over seglets borrowed from a pool.
    ///
    /// The seglets must all be the same size, and that size must be a power
    /// of two when more than one seglet is supplied; violations are
    /// programmer errors and panic.
    pub fn from_seglets(seglets: Vec<Seglet>) -> Self {
        assert!(!seglets.is_empty(), "segment requires at least one seglet");
        let seglet_size = seglets[0].size();
        assert!(seglet_size > 0, "seglet size must be non-zero");
        assert!(
            seglets.iter().all(|s| s.size() == seglet_size),
            "seglets in a segment must share one size"
        );
        let shift = if seglets.len() > 1 {
            assert!(
                seglet_size.is_power_of_two(),
                "multi-seglet segments require a power-of-two seglet size"
            );
            seglet_size.trailing_zeros()
        } else {
            0
        };
        Self::from_storage(Storage::Seglets(seglets), seglet_size, shift, false)
    }

    /// Creates a read-only segment over an externally owned flat buffer,
    /// such as segment bytes received from a replica.
    ///
    /// The resulting segment is closed: it can be checked against a
    /// certificate and iterated, but never appended to. The running
    /// checksum reflects only locally appended metadata, so certificates
    /// for a view come from its original producer, not from
    /// [`certificate`](Self::certificate).
    pub fn from_bytes(buffer: Bytes) -> Self {
        let length = buffer.len();
        assert!(
            length <= u32::MAX as usize,
            "segment buffer exceeds the 32-bit offset space"
        );
        let mut segment = Self::from_storage(Storage::View(buffer), length as u32, 0, true);
        segment.head = length as u32;
        segment
    }

    fn from_storage(storage: Storage, seglet_size: u32, shift: u32, closed: bool) -> Self {
        Segment {
            storage,
            seglet_size,
            seglet_size_shift: shift,
            head: 0,
            closed,
            checksum: Crc32c::new(),
            entry_counts: [0; MAX_ENTRY_TYPES],
            entry_lengths: [0; MAX_ENTRY_TYPES],
        }
    }

    /// Total bytes of backing memory.
    fn capacity(&self) -> u64 {
        self.seglet_size as u64 * self.storage.block_count() as u64
    }

    /// Returns true if appending entries with the given payload lengths, in
    /// order, would leave the head within capacity. Accounts for each
    /// entry's header and length-field overhead.
    pub fn has_space_for(&self, payload_lengths: &[u32]) -> bool {
        let mut head = self.head as u64;
        for &length in payload_lengths {
            head += 1 + length_bytes_for(length) as u64 + length as u64;
        }
        head <= self.capacity()
    }

    /// Appends one entry. On success returns the logical offset of the
    /// payload's first byte.
    ///
    /// The append is all-or-nothing: a closed or full segment is reported
    /// before any byte, counter, or checksum changes.
    pub fn append(&mut self, entry_type: EntryType, data: &[u8]) -> Result<u32> {
        assert!(
            data.len() <= u32::MAX as usize,
            "entry payload exceeds the 32-bit length field"
        );
        let length = data.len() as u32;
        let payload_offset = self.write_entry_metadata(entry_type, length)?;
        self.copy_in(payload_offset, data);
        self.finish_entry(entry_type, payload_offset, length);
        Ok(payload_offset)
    }

    /// Appends one entry whose payload is gathered from a multi-chunk
    /// buffer. Same contract as [`append`](Self::append).
    pub fn append_buffer(&mut self, entry_type: EntryType, buffer: &GatherBuffer) -> Result<u32> {
        assert!(
            buffer.len() <= u32::MAX as usize,
            "entry payload exceeds the 32-bit length field"
        );
        let length = buffer.len() as u32;
        let payload_offset = self.write_entry_metadata(entry_type, length)?;
        let mut offset = payload_offset;
        for chunk in buffer.chunks() {
            self.copy_in(offset, chunk);
            offset += chunk.len() as u32;
        }
        self.finish_entry(entry_type, payload_offset, length);
        Ok(payload_offset)
    }

    /// Writes the header and length field for the next entry and extends
    /// the metadata checksum over them. Returns the payload offset.
    fn write_entry_metadata(&mut self, entry_type: EntryType, length: u32) -> Result<u32> {
        if self.closed {
            return Err(TarnError::SegmentClosed);
        }
        if !self.has_space_for(&[length]) {
            let needed = 1 + length_bytes_for(length) as u32 + length;
            let available = (self.capacity() - self.head as u64).min(u32::MAX as u64) as u32;
            return Err(TarnError::SegmentFull { needed, available });
        }

        let header = EntryHeader::new(entry_type, length);
        let width = header.length_bytes() as usize;
        let length_field = length.to_le_bytes();

        self.copy_in(self.head, &[header.as_byte()]);
        self.copy_in(self.head + 1, &length_field[..width]);
        self.checksum.update(&[header.as_byte()]);
        self.checksum.update(&length_field[..width]);

        Ok(self.head + 1 + width as u32)
    }

    fn finish_entry(&mut self, entry_type: EntryType, payload_offset: u32, length: u32) {
        self.head = payload_offset + length;
        self.entry_counts[entry_type as usize] += 1;
        self.entry_lengths[entry_type as usize] += length;
    }

    /// Closes the segment. Idempotent; every subsequent append fails.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns true once the segment has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the number of bytes appended so far.
    pub fn appended_length(&self) -> u32 {
        self.head
    }

    /// Emits a certificate witnessing the current prefix.
    ///
    /// A copy of the running metadata checksum is extended with the length
    /// field; the running checksum itself is untouched, so appends may
    /// continue and earlier certificates stay valid for their prefixes.
    pub fn certificate(&self) -> Certificate {
        let mut checksum = self.checksum;
        checksum.update(&self.head.to_le_bytes());
        Certificate::new(self.head, checksum.value())
    }

    /// Verifies that the prefix witnessed by `certificate` is intact:
    /// the segment holds at least that many bytes, entry boundaries parse
    /// cleanly up to exactly that length, and the recomputed metadata
    /// checksum matches.
    pub fn check_metadata_integrity(&self, certificate: &Certificate) -> bool {
        let limit = certificate.segment_length;
        if limit as u64 > self.capacity() {
            return false;
        }

        let mut checksum = Crc32c::new();
        let mut offset = 0u32;
        while offset < limit {
            let mut header_byte = [0u8; 1];
            if self.copy_out(offset, &mut header_byte) != 1 {
                return false;
            }
            let header = EntryHeader::from_byte(header_byte[0]);
            let width = header.length_bytes() as usize;

            let mut length_field = [0u8; 4];
            if self.copy_out(offset + 1, &mut length_field[..width]) != width {
                return false;
            }
            let length = decode_length(&length_field[..width]);

            checksum.update(&header_byte);
            checksum.update(&length_field[..width]);

            let entry_end = (offset as u64) + 1 + width as u64 + length as u64;
            if entry_end > limit as u64 {
                return false;
            }
            offset = entry_end as u32;
        }

        checksum.update(&limit.to_le_bytes());
        checksum.value() == certificate.checksum
    }

    /// Reads the entry at `offset`, appending a view of its payload into
    /// `buffer`. Returns the entry's type and its total footprint
    /// (header, length field, and payload bytes).
    pub fn get_entry(&self, offset: u32, buffer: &mut GatherBuffer) -> Result<(EntryType, u32)> {
        let (header, length, payload_offset) = self.parse_entry(offset)?;
        let entry_type = header.entry_type()?;
        self.append_to_buffer(buffer, payload_offset, length);
        Ok((entry_type, 1 + header.length_bytes() as u32 + length))
    }

    /// Parses the entry framing at `offset` without touching the payload.
    /// Returns the header, the payload length, and the payload offset.
    pub(crate) fn parse_entry(&self, offset: u32) -> Result<(EntryHeader, u32, u32)> {
        let corrupted = |reason: &str| TarnError::SegmentCorrupted {
            offset,
            reason: reason.to_string(),
        };

        let mut header_byte = [0u8; 1];
        if self.copy_out(offset, &mut header_byte) != 1 {
            return Err(corrupted("entry header out of range"));
        }
        let header = EntryHeader::from_byte(header_byte[0]);
        let width = header.length_bytes() as usize;

        let mut length_field = [0u8; 4];
        if self.copy_out(offset + 1, &mut length_field[..width]) != width {
            return Err(corrupted("entry length field out of range"));
        }
        let length = decode_length(&length_field[..width]);

        let payload_offset = offset + 1 + width as u32;
        if payload_offset as u64 + length as u64 > self.capacity() {
            return Err(corrupted("entry payload extends past the segment"));
        }
        Ok((header, length, payload_offset))
    }

    /// Appends a view of `[offset, offset + length)` to `buffer`,
    /// zero-copy when the segment wraps an external flat buffer.
    ///
    /// The range must lie within the segment's capacity.
    pub fn append_to_buffer(&self, buffer: &mut GatherBuffer, offset: u32, length: u32) {
        assert!(
            offset as u64 + length as u64 <= self.capacity(),
            "byte range extends past the segment"
        );
        if let Storage::View(bytes) = &self.storage {
            buffer.append_bytes(bytes.slice(offset as usize..offset as usize + length as usize));
            return;
        }
        let mut remaining = length as usize;
        let mut offset = offset;
        while remaining > 0 {
            let Some(run) = self.peek(offset) else { break };
            let n = run.len().min(remaining);
            buffer.append_slice(&run[..n]);
            remaining -= n;
            offset += n as u32;
        }
    }

    /// Appends a view of the entire appended prefix to `buffer`. Returns
    /// the number of bytes appended.
    pub fn append_all_to_buffer(&self, buffer: &mut GatherBuffer) -> u32 {
        self.append_to_buffer(buffer, 0, self.head);
        self.head
    }

    /// Flat-copies up to `dst.len()` bytes starting at the given logical
    /// offset, spanning seglet boundaries as needed. Returns the number of
    /// bytes copied, short if the segment ends first.
    pub fn copy_out(&self, offset: u32, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < dst.len() {
            let Some(run_offset) = offset.checked_add(copied as u32) else {
                break;
            };
            let Some(run) = self.peek(run_offset) else {
                break;
            };
            let n = run.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&run[..n]);
            copied += n;
        }
        copied
    }

    /// Resolves a logical offset to the contiguous bytes underneath it,
    /// out to the end of the containing seglet. Returns `None` for offsets
    /// beyond the segment's capacity.
    #[inline]
    pub fn peek(&self, offset: u32) -> Option<&[u8]> {
        if offset as u64 >= self.capacity() {
            return None;
        }
        let (index, seglet_offset) = self.locate(offset);
        Some(&self.storage.block(index)[seglet_offset as usize..])
    }

    /// Splits a logical offset into (block index, offset within block).
    /// The shift is only valid with multiple seglets; a single block takes
    /// the trivial path regardless of its size.
    #[inline]
    fn locate(&self, offset: u32) -> (usize, u32) {
        if self.seglet_size_shift != 0 {
            (
                (offset >> self.seglet_size_shift) as usize,
                offset & (self.seglet_size - 1),
            )
        } else {
            (0, offset)
        }
    }

    /// Copies `data` into the segment at the given logical offset. The
    /// caller has already checked capacity; writes into read-only storage
    /// copy nothing.
    fn copy_in(&mut self, offset: u32, data: &[u8]) -> usize {
        let mut copied = 0;
        while copied < data.len() {
            let (index, seglet_offset) = self.locate(offset + copied as u32);
            let Some(block) = self.storage.block_mut(index) else {
                break;
            };
            let n = (block.len() - seglet_offset as usize).min(data.len() - copied);
            block[seglet_offset as usize..seglet_offset as usize + n]
                .copy_from_slice(&data[copied..copied + n]);
            copied += n;
        }
        copied
    }

    /// Number of entries of the given type appended over the segment's
    /// lifetime, including entries the log no longer considers live.
    pub fn entry_count(&self, entry_type: EntryType) -> u32 {
        self.entry_counts[entry_type as usize]
    }

    /// Total payload bytes appended for the given type over the segment's
    /// lifetime.
    pub fn entry_lengths(&self, entry_type: EntryType) -> u32 {
        self.entry_lengths[entry_type as usize]
    }

    /// Number of backing blocks this segment currently holds.
    pub fn seglets_allocated(&self) -> usize {
        self.storage.block_count()
    }

    /// Minimum number of seglets needed to cover the appended bytes.
    pub fn seglets_in_use(&self) -> usize {
        if self.head == 0 {
            return 0;
        }
        self.head.div_ceil(self.seglet_size) as usize
    }

    /// Releases `count` seglets from the tail back to their pool.
    ///
    /// Succeeds only on a closed segment whose appended bytes all fit in
    /// the seglets that remain; failure leaves the segment unchanged.
    /// Segments over self-allocated or external memory hold no seglets and
    /// can only "free" zero of them.
    pub fn free_unused_seglets(&mut self, count: usize) -> bool {
        if !self.closed {
            return false;
        }
        let Storage::Seglets(seglets) = &mut self.storage else {
            return count == 0;
        };
        if count > seglets.len() {
            return false;
        }
        let remaining = seglets.len() - count;
        if self.head as u64 > self.seglet_size as u64 * remaining as u64 {
            return false;
        }
        seglets.truncate(remaining);
        true
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("head", &self.head)
            .field("closed", &self.closed)
            .field("capacity", &self.capacity())
            .field("blocks", &self.storage.block_count())
            .finish()
    }
}
