mod print;
mod status;

pub use print::BlkPrint;
pub use status::BlkStatus;

use crate::touch::{Direction, TouchTracker};

use serde::{Deserialize, Serialize};
use tracing::debug;

use std::fmt;

pub type Addr = u64;

// values an invalidated block carries until its next install
pub const MAX_ADDR: Addr = Addr::MAX;
pub const INVALID_REQUESTER_ID: i32 = -1;
pub const INVALID_TASK_ID: u32 = u32::MAX;

/// Simulation time, supplied by whoever drives the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tick(pub u64);

/// Metadata of one physical cache line plus its byte touch tracking.
///
/// The tag store allocates a `CacheBlk` per physical line, calls
/// [`CacheBlk::initialize`] once with the block size, then [`CacheBlk::install`]
/// on every fill. Touch tracking is only cleared by [`CacheBlk::reset`], which
/// the tag store must sequence itself when a line's contents are discarded.
#[derive(Clone, Debug)]
pub struct CacheBlk {
    pub tag: Addr,
    status: BlkStatus,
    pub src_requester_id: i32,
    pub task_id: u32,
    tick_inserted: Tick,
    when_ready: Tick,
    ref_count: u32,
    touch: TouchTracker,
}

impl CacheBlk {
    pub fn new() -> Self {
        CacheBlk {
            tag: MAX_ADDR,
            status: BlkStatus::empty(),
            src_requester_id: INVALID_REQUESTER_ID,
            task_id: INVALID_TASK_ID,
            tick_inserted: Tick(0),
            when_ready: Tick(0),
            ref_count: 0,
            touch: TouchTracker::new(),
        }
    }

    /// Sizes touch tracking for this line. Called once when the line is allocated.
    pub fn initialize(&mut self, block_size: u32) {
        self.touch.initialize(block_size);
    }

    /// Records new contents for this line. Touch tracking is left as is.
    pub fn install(&mut self, tag: Addr, is_secure: bool, src_requester_id: i32, task_id: u32, now: Tick) {
        self.tag = tag;
        self.src_requester_id = src_requester_id;
        self.task_id = task_id;
        self.tick_inserted = now;

        // insertion counts as a reference
        self.ref_count = 1;

        self.status = if is_secure { BlkStatus::SECURE } else { BlkStatus::empty() };
        debug!(tag, is_secure, src_requester_id, task_id, tick = now.0, "block installed");
    }

    /// Clears byte touch tracking (bitmap and counters).
    pub fn reset(&mut self) {
        self.touch.reset();
        debug!(tag = self.tag, "touch tracking reset");
    }

    /// Drops the line's identity and state. Touch tracking is left as is.
    pub fn invalidate(&mut self) {
        self.tag = MAX_ADDR;
        self.status = BlkStatus::empty();
        self.src_requester_id = INVALID_REQUESTER_ID;
        self.task_id = INVALID_TASK_ID;
        self.tick_inserted = Tick(0);
        self.when_ready = Tick(0);
        self.ref_count = 0;
        debug!("block invalidated");
    }

    pub fn record_access(&mut self, direction: Direction, offset: u32, length: u32) {
        self.touch.record_access(direction, offset, length);
    }

    pub fn touch(&self) -> &TouchTracker {
        &self.touch
    }

    pub fn status(&self) -> BlkStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status.contains(BlkStatus::VALID)
    }

    pub fn is_writable(&self) -> bool {
        self.status.contains(BlkStatus::WRITABLE)
    }

    pub fn is_readable(&self) -> bool {
        self.status.contains(BlkStatus::READABLE)
    }

    pub fn is_dirty(&self) -> bool {
        self.status.contains(BlkStatus::DIRTY)
    }

    pub fn is_secure(&self) -> bool {
        self.status.contains(BlkStatus::SECURE)
    }

    pub fn set_valid(&mut self) {
        self.status.insert(BlkStatus::VALID);
    }

    pub fn set_writable(&mut self) {
        self.status.insert(BlkStatus::WRITABLE);
    }

    pub fn set_readable(&mut self) {
        self.status.insert(BlkStatus::READABLE);
    }

    pub fn set_dirty(&mut self) {
        self.status.insert(BlkStatus::DIRTY);
    }

    pub fn clear_dirty(&mut self) {
        self.status.remove(BlkStatus::DIRTY);
    }

    pub fn set_secure(&mut self) {
        self.status.insert(BlkStatus::SECURE);
    }

    pub fn tick_inserted(&self) -> Tick {
        self.tick_inserted
    }

    /// Earliest tick at which the line's data may be used.
    pub fn when_ready(&self) -> Tick {
        self.when_ready
    }

    pub fn set_when_ready(&mut self, tick: Tick) {
        self.when_ready = tick;
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn increment_ref(&mut self) {
        self.ref_count = self.ref_count.saturating_add(1);
    }

    /// Short `VEMS` summary, see [`BlkPrint`].
    pub fn print<'a>(&'a self, prefix: &'a str) -> BlkPrint<'a> {
        BlkPrint::new(self, prefix)
    }
}

impl Default for CacheBlk {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CacheBlk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "state: {:x} ({}) valid: {} writable: {} readable: {} dirty: {} secure: {} | tag: {:#x}",
            self.status.bits(),
            self.status.state_char(),
            self.is_valid() as u8,
            self.is_writable() as u8,
            self.is_readable() as u8,
            self.is_dirty() as u8,
            self.is_secure() as u8,
            self.tag,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blk() -> CacheBlk {
        let mut b = CacheBlk::new();
        b.initialize(64);
        b
    }

    #[test]
    fn install_sets_metadata() {
        let mut b = blk();
        b.install(0x1000, false, 3, 7, Tick(42));
        assert_eq!(b.tag, 0x1000);
        assert_eq!(b.src_requester_id, 3);
        assert_eq!(b.task_id, 7);
        assert_eq!(b.tick_inserted(), Tick(42));
        assert_eq!(b.ref_count(), 1);
        assert!(b.status().is_empty());
    }

    #[test]
    fn install_secure_replaces_previous_status() {
        let mut b = blk();
        b.set_valid();
        b.set_writable();
        b.set_dirty();
        b.install(0x2000, true, 0, 0, Tick(1));
        assert_eq!(b.status(), BlkStatus::SECURE);
        assert!(b.is_secure());
        assert!(!b.is_valid());
        assert!(!b.is_writable());
        assert!(!b.is_dirty());
    }

    #[test]
    fn install_does_not_reset_touch_tracking() {
        let mut b = blk();
        b.install(0x40, false, 0, 0, Tick(1));
        b.record_access(Direction::Write, 0, 16);
        b.install(0x80, false, 0, 0, Tick(2));
        assert_eq!(b.touch().touched_bytes(), 16);
        assert_eq!(b.touch().unique_bytes_written(), 16);

        b.reset();
        assert_eq!(b.touch().touched_bytes(), 0);
        assert_eq!(b.touch().bytes_written_total(), 0);
        // reset leaves metadata alone
        assert_eq!(b.tag, 0x80);
    }

    #[test]
    fn invalidate_clears_identity_but_not_touch() {
        let mut b = blk();
        b.install(0x40, true, 1, 2, Tick(5));
        b.set_valid();
        b.set_when_ready(Tick(9));
        b.record_access(Direction::Read, 0, 4);
        b.invalidate();
        assert_eq!(b.tag, MAX_ADDR);
        assert!(b.status().is_empty());
        assert_eq!(b.src_requester_id, INVALID_REQUESTER_ID);
        assert_eq!(b.task_id, INVALID_TASK_ID);
        assert_eq!(b.ref_count(), 0);
        assert_eq!(b.when_ready(), Tick(0));
        assert_eq!(b.touch().touched_bytes(), 4);
    }

    #[test]
    fn ref_count_grows_after_install() {
        let mut b = blk();
        b.install(0x40, false, 0, 0, Tick(0));
        b.increment_ref();
        b.increment_ref();
        assert_eq!(b.ref_count(), 3);
        b.install(0x80, false, 0, 0, Tick(1));
        assert_eq!(b.ref_count(), 1);
    }

    #[test]
    fn dirty_can_be_cleared() {
        let mut b = blk();
        b.set_dirty();
        assert!(b.is_dirty());
        b.clear_dirty();
        assert!(!b.is_dirty());
    }

    #[test]
    fn long_form_display() {
        let mut b = blk();
        b.install(0xbeef, false, 0, 0, Tick(0));
        b.set_valid();
        b.set_readable();
        b.set_writable();
        assert_eq!(
            b.to_string(),
            "state: 7 (E) valid: 1 writable: 1 readable: 1 dirty: 0 secure: 0 | tag: 0xbeef"
        );
    }
}
