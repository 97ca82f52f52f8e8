//! Seglet pool manager.

use crate::seglet::Seglet;
use parking_lot::Mutex;
use std::sync::Arc;
use sysinfo::System;
use tarn_common::{LogConfig, Result, TarnError};

/// Minimum pool size for auto-sized pools.
const MIN_AUTO_SEGLETS: usize = 16;

/// Pool internals shared with every outstanding seglet.
///
/// Seglets hold an `Arc` to this so a chunk can find its way home no matter
/// where the loan ends; the pool itself holds no references to outstanding
/// seglets.
pub(crate) struct PoolShared {
    seglet_size: u32,
    free: Mutex<Vec<Box<[u8]>>>,
}

impl PoolShared {
    /// Returns a chunk to the free list.
    pub(crate) fn release(&self, block: Box<[u8]>) {
        debug_assert_eq!(block.len(), self.seglet_size as usize);
        self.free.lock().push(block);
    }
}

/// A pool of fixed-size memory chunks loaned to segments.
///
/// All seglets from one pool share a single size. The free list is
/// mutex-protected so seglets may be returned from any thread, but the pool
/// makes no fairness or ordering guarantees.
pub struct SegletPool {
    shared: Arc<PoolShared>,
    total: usize,
}

impl SegletPool {
    /// Creates a pool holding `count` seglets of `seglet_size` bytes each.
    ///
    /// All pool memory is allocated up front and zeroed.
    pub fn new(seglet_size: u32, count: usize) -> Self {
        assert!(seglet_size > 0, "seglet size must be non-zero");

        let free: Vec<Box<[u8]>> = (0..count)
            .map(|_| vec![0u8; seglet_size as usize].into_boxed_slice())
            .collect();

        Self {
            shared: Arc::new(PoolShared {
                seglet_size,
                free: Mutex::new(free),
            }),
            total: count,
        }
    }

    /// Creates a pool sized to 25% of available system RAM.
    ///
    /// Queries the system for available memory and dedicates a quarter of it
    /// to seglets, with a small floor so tests and low-memory machines still
    /// get a working pool.
    pub fn auto_sized(seglet_size: u32) -> Self {
        assert!(seglet_size > 0, "seglet size must be non-zero");

        let mut sys = System::new_all();
        sys.refresh_memory();

        let available_bytes = sys.available_memory() as usize;
        let target_bytes = available_bytes / 4;
        let count = (target_bytes / seglet_size as usize).max(MIN_AUTO_SEGLETS);

        Self::new(seglet_size, count)
    }

    /// Creates a pool from a validated log configuration.
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.seglet_size, config.pool_seglets()))
    }

    /// Returns the size in bytes of every seglet in this pool.
    pub fn seglet_size(&self) -> u32 {
        self.shared.seglet_size
    }

    /// Returns the total number of seglets this pool owns.
    pub fn seglet_count(&self) -> usize {
        self.total
    }

    /// Returns the number of seglets currently on the free list.
    pub fn free_count(&self) -> usize {
        self.shared.free.lock().len()
    }

    /// Takes one seglet from the pool, or `None` if the pool is exhausted.
    pub fn alloc(&self) -> Option<Seglet> {
        let block = self.shared.free.lock().pop()?;
        Some(Seglet::new(block, Arc::clone(&self.shared)))
    }

    /// Takes `count` seglets from the pool, all or nothing.
    pub fn alloc_many(&self, count: usize) -> Result<Vec<Seglet>> {
        let mut free = self.shared.free.lock();
        if free.len() < count {
            return Err(TarnError::SegletPoolExhausted {
                requested: count,
                available: free.len(),
            });
        }
        let start = free.len() - count;
        let seglets = free
            .drain(start..)
            .map(|block| Seglet::new(block, Arc::clone(&self.shared)))
            .collect();
        Ok(seglets)
    }
}
