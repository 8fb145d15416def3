use crate::blk::{Addr, CacheBlk, Tick};
use crate::touch::serialize::TouchStats;
use crate::touch::Direction;

use serde::Serialize;
use tracing::debug;

/// A flat array of cache lines sharing one block size. Stands in for the tag
/// store that owns `CacheBlk`s: it allocates them, sequences reset before
/// refill, and turns accesses into touch updates.
pub struct TagStore {
    blks: Vec<CacheBlk>,
    block_size: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct LineReport {
    pub line: usize,
    pub tag: Addr,
    pub state: char,
    pub flags: String,
    pub touch: TouchStats,
}

impl TagStore {
    pub fn new(lines: usize, block_size: u32) -> Self {
        let blks = (0..lines)
            .map(|_| {
                let mut blk = CacheBlk::new();
                blk.initialize(block_size);
                blk
            })
            .collect();
        debug!(lines, block_size, "tag store allocated");
        TagStore { blks, block_size }
    }

    pub fn len(&self) -> usize {
        self.blks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blks.is_empty()
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn blk(&self, line: usize) -> Option<&CacheBlk> {
        self.blks.get(line)
    }

    pub fn blk_mut(&mut self, line: usize) -> Option<&mut CacheBlk> {
        self.blks.get_mut(line)
    }

    /// Discards the line's old touch state, installs the new block and marks it
    /// valid and readable.
    pub fn fill(
        &mut self,
        line: usize,
        tag: Addr,
        is_secure: bool,
        src_requester_id: i32,
        task_id: u32,
        now: Tick,
    ) -> Option<&mut CacheBlk> {
        let blk = self.blks.get_mut(line)?;
        blk.reset();
        blk.install(tag, is_secure, src_requester_id, task_id, now);
        blk.set_valid();
        blk.set_readable();
        Some(blk)
    }

    /// Records a byte access on a line. Writes also mark the line dirty.
    pub fn access(&mut self, line: usize, direction: Direction, offset: u32, length: u32) -> Option<&mut CacheBlk> {
        let blk = self.blks.get_mut(line)?;
        if !blk.is_valid() {
            debug!(line, ?direction, "access to invalid line");
        }
        blk.record_access(direction, offset, length);
        if direction == Direction::Write {
            blk.set_dirty();
        }
        Some(blk)
    }

    /// Resets touch tracking and invalidates the line, returning the stats it
    /// had accumulated.
    pub fn evict(&mut self, line: usize) -> Option<TouchStats> {
        let blk = self.blks.get_mut(line)?;
        let stats = blk.touch().stats();
        debug!(line, tag = blk.tag, touched = stats.touched_bytes, "evicting line");
        blk.reset();
        blk.invalidate();
        Some(stats)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheBlk> {
        self.blks.iter()
    }

    pub fn report(&self) -> Vec<LineReport> {
        self.blks
            .iter()
            .enumerate()
            .map(|(line, blk)| LineReport {
                line,
                tag: blk.tag,
                state: blk.status().state_char(),
                flags: blk.print("").to_string(),
                touch: blk.touch().stats(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_initialized_with_block_size() {
        let store = TagStore::new(4, 128);
        assert_eq!(store.len(), 4);
        assert!(store.iter().all(|b| b.touch().bitmap().capacity() == 128));
        assert!(store.iter().all(|b| !b.is_valid()));
    }

    #[test]
    fn fill_resets_stale_touch_state() {
        let mut store = TagStore::new(2, 64);
        store.fill(0, 0x1000, false, 0, 0, Tick(1));
        store.access(0, Direction::Read, 0, 32);

        let blk = store.fill(0, 0x2000, false, 0, 0, Tick(2)).unwrap();
        assert_eq!(blk.tag, 0x2000);
        assert!(blk.is_valid() && blk.is_readable());
        assert_eq!(blk.touch().touched_bytes(), 0);
        assert_eq!(blk.touch().bytes_read_total(), 0);
    }

    #[test]
    fn write_marks_dirty() {
        let mut store = TagStore::new(1, 64);
        store.fill(0, 0x40, false, 0, 0, Tick(0));
        let blk = store.access(0, Direction::Write, 8, 8).unwrap();
        assert!(blk.is_dirty());
        assert_eq!(blk.touch().unique_bytes_written(), 8);
    }

    #[test]
    fn evict_returns_stats_and_invalidates() {
        let mut store = TagStore::new(1, 64);
        store.fill(0, 0x40, false, 0, 0, Tick(0));
        store.access(0, Direction::Write, 0, 8);
        store.access(0, Direction::Read, 4, 8);

        let stats = store.evict(0).unwrap();
        assert_eq!(stats.touched_bytes, 12);
        assert_eq!(stats.unique_bytes_read, 4);

        let blk = store.blk(0).unwrap();
        assert!(!blk.is_valid());
        assert_eq!(blk.touch().touched_bytes(), 0);
    }

    #[test]
    fn out_of_range_lines_are_none() {
        let mut store = TagStore::new(1, 64);
        assert!(store.blk(1).is_none());
        assert!(store.access(5, Direction::Read, 0, 1).is_none());
        assert!(store.evict(1).is_none());
        assert!(store.fill(1, 0, false, 0, 0, Tick(0)).is_none());
    }

    #[test]
    fn report_lists_every_line() {
        let mut store = TagStore::new(2, 64);
        store.fill(1, 0x80, true, 0, 0, Tick(0));
        store.access(1, Direction::Write, 0, 64);
        let report = store.report();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].flags, "blk ----");
        assert_eq!(report[1].flags, "blk V-MS");
        assert_eq!(report[1].state, 'O');
        assert_eq!(report[1].touch.touched_bytes, 64);
    }
}
