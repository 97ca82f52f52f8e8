//! Gather-style byte container.

use bytes::{Bytes, BytesMut};

/// An ordered sequence of byte chunks treated as one logical byte string.
///
/// Segments gather appends out of a `GatherBuffer` and append payload views
/// into one, so entries never need to be contiguous in memory. Chunks added
/// with [`append_bytes`](Self::append_bytes) are reference-counted views and
/// cost no copy; [`append_slice`](Self::append_slice) copies.
#[derive(Debug, Clone, Default)]
pub struct GatherBuffer {
    chunks: Vec<Bytes>,
    length: usize,
}

impl GatherBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of logical bytes in the buffer.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends a chunk without copying. Zero-length chunks are dropped.
    pub fn append_bytes(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.length += chunk.len();
        self.chunks.push(chunk);
    }

    /// Appends a copy of the given bytes.
    pub fn append_slice(&mut self, data: &[u8]) {
        self.append_bytes(Bytes::copy_from_slice(data));
    }

    /// Returns the underlying chunks in logical order.
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Flattens the buffer into a single contiguous `Bytes`.
    ///
    /// Free when the buffer already holds zero or one chunk.
    pub fn to_bytes(&self) -> Bytes {
        match self.chunks.len() {
            0 => Bytes::new(),
            1 => self.chunks[0].clone(),
            _ => {
                let mut flat = BytesMut::with_capacity(self.length);
                for chunk in &self.chunks {
                    flat.extend_from_slice(chunk);
                }
                flat.freeze()
            }
        }
    }

    /// Copies as many logical bytes as fit into `dst`, from the front.
    /// Returns the number of bytes copied.
    pub fn copy_to_slice(&self, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        for chunk in &self.chunks {
            if copied == dst.len() {
                break;
            }
            let n = chunk.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&chunk[..n]);
            copied += n;
        }
        copied
    }

    /// Drops all chunks.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.length = 0;
    }
}
