pub mod serialize;

use crate::bitmap::TouchBitmap;

use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

/// Byte-granularity touch tracking for one cache block.
///
/// Reads and writes share a single bitmap, so a byte first touched by a write
/// does not count as a unique read later on (and vice versa).
#[derive(Clone, Debug, Default)]
pub struct TouchTracker {
    bitmap: TouchBitmap,

    // totals count the requested access size, unique counts only bytes the
    // bitmap newly marked
    bytes_read_total: u64,
    bytes_written_total: u64,
    unique_bytes_read: u64,
    unique_bytes_written: u64,
}

impl TouchTracker {
    pub fn new() -> Self {
        TouchTracker {
            bitmap: TouchBitmap::new(),
            bytes_read_total: 0,
            bytes_written_total: 0,
            unique_bytes_read: 0,
            unique_bytes_written: 0,
        }
    }

    /// Sizes the bitmap for `block_size` bytes and zeroes all counters.
    pub fn initialize(&mut self, block_size: u32) {
        self.bitmap.initialize(block_size);
        self.zero_counters();
    }

    pub fn record_access(&mut self, direction: Direction, offset: u32, length: u32) {
        let capacity = self.bitmap.capacity();
        if length > 0 && (offset as u64).saturating_add(length as u64) > capacity {
            debug!(offset, length, capacity, "touch range clamped to block");
        }

        let newly = self.bitmap.set_range(offset, length) as u64;
        match direction {
            Direction::Read => {
                self.bytes_read_total = self.bytes_read_total.saturating_add(length as u64);
                self.unique_bytes_read += newly;
            },
            Direction::Write => {
                self.bytes_written_total = self.bytes_written_total.saturating_add(length as u64);
                self.unique_bytes_written += newly;
            },
        }
        trace!(?direction, offset, length, newly, "recorded access");
    }

    /// Clears the bitmap and all four counters.
    pub fn reset(&mut self) {
        self.bitmap.clear_all();
        self.zero_counters();
    }

    fn zero_counters(&mut self) {
        self.bytes_read_total = 0;
        self.bytes_written_total = 0;
        self.unique_bytes_read = 0;
        self.unique_bytes_written = 0;
    }

    pub fn bitmap(&self) -> &TouchBitmap {
        &self.bitmap
    }

    pub fn bytes_read_total(&self) -> u64 {
        self.bytes_read_total
    }

    pub fn bytes_written_total(&self) -> u64 {
        self.bytes_written_total
    }

    pub fn unique_bytes_read(&self) -> u64 {
        self.unique_bytes_read
    }

    pub fn unique_bytes_written(&self) -> u64 {
        self.unique_bytes_written
    }

    /// Distinct bytes touched in either direction since the last reset.
    pub fn touched_bytes(&self) -> u64 {
        self.bitmap.population_count()
    }
}
