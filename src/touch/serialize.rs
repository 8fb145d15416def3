use serde::{Deserialize, Serialize};

/// Point-in-time copy of a tracker's counters, for reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchStats {
    pub bytes_read_total: u64,
    pub bytes_written_total: u64,
    pub unique_bytes_read: u64,
    pub unique_bytes_written: u64,
    pub touched_bytes: u64,
    pub capacity: u64,
}

impl super::TouchTracker {
    pub fn stats(&self) -> TouchStats {
        TouchStats {
            bytes_read_total: self.bytes_read_total,
            bytes_written_total: self.bytes_written_total,
            unique_bytes_read: self.unique_bytes_read,
            unique_bytes_written: self.unique_bytes_written,
            touched_bytes: self.bitmap.population_count(),
            capacity: self.bitmap.capacity(),
        }
    }
}
