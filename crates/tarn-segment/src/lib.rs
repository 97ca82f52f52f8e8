//! Log segments for TarnKV.
//!
//! Segments are miniature append-only logs that immutable data such as
//! objects and tombstones are appended to. Each appended piece of data is
//! an "entry" carrying a type and a length, and all entry metadata is
//! covered by a running CRC32C so that a segment prefix can be verified
//! against a [`Certificate`] before it is trusted. The enclosing log ties
//! many segments together; keeping them small makes garbage collection and
//! replica transfer cheap.
//!
//! A segment's bytes live either in one self-allocated block, in a list of
//! fixed-size seglets borrowed from a [`tarn_seglet::SegletPool`], or in a
//! read-only external buffer (the form a replica reconstructs after
//! receiving segment bytes over the wire). Entries may span seglet
//! boundaries, so readers go through [`Segment::peek`] or a
//! [`tarn_common::GatherBuffer`] rather than assuming contiguity.

pub mod certificate;
pub mod checksum;
pub mod constants;
pub mod entry;
pub mod iterator;
pub mod segment;

pub use certificate::Certificate;
pub use entry::{EntryHeader, EntryType};
pub use iterator::SegmentIterator;
pub use segment::Segment;
