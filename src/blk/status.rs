bitflags::bitflags! {
    /// Coherence and bookkeeping state of a cache block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlkStatus: u8 {
        const VALID = 1 << 0;
        /// Write permission.
        const WRITABLE = 1 << 1;
        /// Read permission; a block can be valid without it while a fill is pending.
        const READABLE = 1 << 2;
        /// Modified relative to the next level.
        const DIRTY = 1 << 3;
        /// Brought in by a hardware prefetch.
        const HW_PREFETCHED = 1 << 5;
        const SECURE = 1 << 6;
    }
}

impl BlkStatus {
    /// MOESI letter for the current permissions.
    pub fn state_char(&self) -> char {
        if !self.contains(BlkStatus::VALID) {
            return 'I';
        }
        match (self.contains(BlkStatus::WRITABLE), self.contains(BlkStatus::DIRTY)) {
            (true, true) => 'M',
            (true, false) => 'E',
            (false, true) => 'O',
            (false, false) => 'S',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_chars() {
        assert_eq!(BlkStatus::empty().state_char(), 'I');
        assert_eq!(BlkStatus::DIRTY.state_char(), 'I');
        assert_eq!((BlkStatus::VALID | BlkStatus::WRITABLE | BlkStatus::DIRTY).state_char(), 'M');
        assert_eq!((BlkStatus::VALID | BlkStatus::WRITABLE).state_char(), 'E');
        assert_eq!((BlkStatus::VALID | BlkStatus::DIRTY).state_char(), 'O');
        assert_eq!((BlkStatus::VALID | BlkStatus::READABLE).state_char(), 'S');
    }
}
