/// Extends 16-bit RTP sequence numbers to 32 bits by counting wraps.
#[derive(Debug, Default, Clone)]
pub struct SeqExt {
    cycles: u32,
    last: Option<u16>,
}

impl SeqExt {
    /// Returns the extended sequence number for `seq`.
    ///
    /// A backwards jump of more than half the space counts as a wrap; a small
    /// backwards jump (reordering) is extended within the current cycle.
    pub fn update(&mut self, seq: u16) -> u32 {
        if let Some(last) = self.last {
            if seq < last && last.wrapping_sub(seq) > 0x8000 {
                self.cycles = self.cycles.wrapping_add(1 << 16);
            }
        }
        self.last = Some(seq);
        self.cycles | u32::from(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_increase_cycle() {
        let mut s = SeqExt::default();
        assert_eq!(s.update(65_534), 65_534);
        assert_eq!(s.update(65_535), 65_535);
        assert_eq!(s.update(0), 65_536);
        assert_eq!(s.update(1), 65_537);
    }

    #[test]
    fn reordering_does_not_wrap() {
        let mut s = SeqExt::default();
        s.update(100);
        assert_eq!(s.update(98), 98);
        assert_eq!(s.update(101), 101);
    }
}
