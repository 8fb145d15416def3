use super::CacheBlk;

use std::fmt;

/// Renders a block as `<prefix>blk VEMS`, one column per flag, `-` when unset.
pub struct BlkPrint<'a> {
    blk: &'a CacheBlk,
    prefix: &'a str,
}

impl<'a> BlkPrint<'a> {
    pub fn new(blk: &'a CacheBlk, prefix: &'a str) -> Self {
        BlkPrint { blk, prefix }
    }
}

impl<'a> fmt::Display for BlkPrint<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}blk {}{}{}{}",
            self.prefix,
            if self.blk.is_valid() { 'V' } else { '-' },
            if self.blk.is_writable() { 'E' } else { '-' },
            if self.blk.is_dirty() { 'M' } else { '-' },
            if self.blk.is_secure() { 'S' } else { '-' },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::{CacheBlk, Tick};

    #[test]
    fn flags_in_fixed_order() {
        let mut blk = CacheBlk::new();
        assert_eq!(blk.print("").to_string(), "blk ----");

        blk.install(0x40, true, 0, 0, Tick(0));
        assert_eq!(blk.print("  ").to_string(), "  blk ---S");

        blk.set_valid();
        blk.set_dirty();
        assert_eq!(blk.print("").to_string(), "blk V-MS");

        blk.set_writable();
        assert_eq!(blk.print("l3: ").to_string(), "l3: blk VEMS");
    }
}
