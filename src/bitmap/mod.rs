const WORD_BITS: u64 = 64;

/// One bit per byte of a cache block, packed into 64-bit words.
///
/// Byte `i` lives in word `i >> 6`, bit `i & 63`. The bitmap is sized in whole
/// words, so its capacity may run up to 63 bytes past the block size; callers
/// never address that padding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TouchBitmap {
    words: Vec<u64>,
}

impl TouchBitmap {
    /// An uninitialized bitmap: every operation on it is a no-op.
    pub fn new() -> Self {
        TouchBitmap { words: Vec::new() }
    }

    pub fn with_block_size(block_size: u32) -> Self {
        let mut bitmap = TouchBitmap::new();
        bitmap.initialize(block_size);
        bitmap
    }

    /// Sizes the bitmap to cover `block_size` bytes and zeroes it.
    /// A block size of 0 leaves the bitmap uninitialized.
    pub fn initialize(&mut self, block_size: u32) {
        let words = (block_size as usize + 63) / 64;
        self.words.clear();
        self.words.resize(words, 0);
    }

    pub fn is_initialized(&self) -> bool {
        !self.words.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Number of addressable bytes, always a multiple of 64.
    pub fn capacity(&self) -> u64 {
        self.words.len() as u64 * WORD_BITS
    }

    pub fn clear_all(&mut self) {
        for word in self.words.iter_mut() {
            *word = 0;
        }
    }

    /// Marks bytes `[offset, offset + length)` as touched and returns how many
    /// of them were not touched before.
    ///
    /// The range is clamped to the bitmap's capacity. An offset past the end,
    /// a zero length or an uninitialized bitmap marks nothing and returns 0.
    pub fn set_range(&mut self, offset: u32, length: u32) -> u32 {
        if length == 0 || self.words.is_empty() {
            return 0;
        }
        let capacity = self.capacity();
        let start = offset as u64;
        if start >= capacity {
            return 0;
        }
        let end = start.saturating_add(length as u64).min(capacity);

        let first_word = (start / WORD_BITS) as usize;
        let last_word = ((end - 1) / WORD_BITS) as usize; // inclusive

        let mut newly_set = 0;
        for w in first_word..=last_word {
            let base = w as u64 * WORD_BITS;
            // intersection of [start, end) with this word's span
            let a = start.max(base);
            let b = end.min(base + WORD_BITS);
            let mask = run_mask((a - base) as u32, (b - a) as u32);

            let old = self.words[w];
            newly_set += (mask & !old).count_ones();
            self.words[w] = old | mask;
        }
        newly_set
    }

    pub fn is_set(&self, offset: u32) -> bool {
        match self.words.get(offset as usize / 64) {
            Some(word) => *word & (1u64 << (offset % 64)) != 0,
            None => false,
        }
    }

    /// Total number of touched bytes.
    pub fn population_count(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }
}

// Mask of `len` consecutive ones starting at bit `off`, with `off + len <= 64`.
// A full word is special-cased: `1 << 64` overflows.
fn run_mask(off: u32, len: u32) -> u64 {
    if off == 0 && len == 64 {
        !0
    } else {
        ((1u64 << len) - 1) << off
    }
}
