//! Configuration structures for the TarnKV log.

use crate::error::{Result, TarnError};
use serde::{Deserialize, Serialize};

/// Configuration for the in-memory log and its segment memory.
///
/// Segments are carved out of a pool of fixed-size seglets, so the segment
/// size must be a whole multiple of the seglet size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Logical size of each segment in bytes.
    pub segment_size: u32,
    /// Size of each seglet in bytes. Must be a power of two.
    pub seglet_size: u32,
    /// Total memory reserved for the seglet pool, in bytes.
    pub pool_bytes: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            segment_size: 8 * 1024 * 1024,  // 8 MB
            seglet_size: 64 * 1024,         // 64 KB
            pool_bytes: 256 * 1024 * 1024,  // 256 MB
        }
    }
}

impl LogConfig {
    /// Returns the number of seglets needed to back one full segment.
    pub fn seglets_per_segment(&self) -> usize {
        (self.segment_size / self.seglet_size) as usize
    }

    /// Returns the number of seglets the pool can hold.
    pub fn pool_seglets(&self) -> usize {
        self.pool_bytes / self.seglet_size as usize
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.seglet_size == 0 {
            return Err(TarnError::InvalidParameter {
                name: "seglet_size".to_string(),
                value: self.seglet_size.to_string(),
            });
        }
        if !self.seglet_size.is_power_of_two() {
            return Err(TarnError::InvalidParameter {
                name: "seglet_size".to_string(),
                value: self.seglet_size.to_string(),
            });
        }
        if self.segment_size == 0 || self.segment_size % self.seglet_size != 0 {
            return Err(TarnError::InvalidParameter {
                name: "segment_size".to_string(),
                value: self.segment_size.to_string(),
            });
        }
        if self.pool_bytes < self.segment_size as usize {
            return Err(TarnError::InvalidParameter {
                name: "pool_bytes".to_string(),
                value: self.pool_bytes.to_string(),
            });
        }
        Ok(())
    }
}
