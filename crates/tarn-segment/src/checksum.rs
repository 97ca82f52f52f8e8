//! Incremental CRC32C accumulator.

/// A running CRC32C (Castagnoli) over a byte stream.
///
/// `Copy` is deliberate: certificate emission extends a copy of the running
/// checksum with the segment length and leaves the original untouched, so
/// later appends continue from the same state. The `crc32c` crate uses the
/// SSE 4.2 / ARMv8 CRC instructions when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32c(u32);

impl Crc32c {
    /// Creates an accumulator over the empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the checksum with the given bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.0 = crc32c::crc32c_append(self.0, data);
    }

    /// Returns the checksum of everything fed so far.
    pub fn value(&self) -> u32 {
        self.0
    }
}
