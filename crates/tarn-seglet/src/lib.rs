//! Seglet pool for TarnKV.
//!
//! Segments store their bytes in fixed-size memory chunks called seglets,
//! borrowed from a shared pool and returned when the segment is torn down
//! or trimmed. Building segments out of uniform chunks lets the log clean
//! and replicate partially-filled segments without copying them into
//! right-sized allocations.

pub mod pool;
pub mod seglet;

pub use pool::SegletPool;
pub use seglet::Seglet;
