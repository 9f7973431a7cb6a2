//! Thumb If-Then block state.
//!
//! The state is packed as four 8-bit lanes, lane 0 describing the next
//! instruction. A used lane holds `((cond << 4) | 1) ^ 0xE0` and an unused
//! lane is zero, so a zero word means "not in an IT block" and a lane whose
//! high nibble is zero means "always". This is the layout of the ITSTATE
//! guest slot.

use crate::types::Cond;

/// Packed IT state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ItState(u32);

impl ItState {
    /// State outside any IT block.
    pub const NONE: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn lane(cond: u32) -> u32 {
        ((cond << 4) | 1) ^ 0xE0
    }

    /// State after an `IT firstcond, mask` instruction.
    ///
    /// Returns `None` for a zero mask (a hint, not an IT), for
    /// `firstcond == 0b1111`, and for an `AL` block with an else slot.
    pub const fn from_it(firstcond: u32, mask: u32) -> Option<Self> {
        let firstcond = firstcond & 0xf;
        let mask = mask & 0xf;
        if mask == 0 || firstcond == 0xf {
            return None;
        }
        // Walk the architectural 8-bit ITSTATE, emitting one lane per step.
        let mut arch = (firstcond << 4) | mask;
        let mut packed = 0u32;
        let mut slot = 0;
        while arch & 0xf != 0 {
            let cond = arch >> 4;
            if cond == 0xf {
                return None;
            }
            packed |= Self::lane(cond) << (8 * slot);
            slot += 1;
            arch = (arch & 0xe0) | ((arch << 1) & 0x1f);
        }
        Some(Self(packed))
    }

    /// State for the following instruction.
    #[must_use]
    pub const fn advance(self) -> Self {
        Self(self.0 >> 8)
    }

    /// Check if the next instruction is inside an IT block.
    pub const fn in_block(self) -> bool {
        self.0 != 0
    }

    /// Check if the next instruction is the last one of its IT block.
    pub const fn is_last(self) -> bool {
        self.in_block() && self.0 >> 8 == 0
    }

    /// Condition governing the next instruction (`Al` outside a block).
    pub const fn current_cond(self) -> Cond {
        let lane = self.0 & 0xf0;
        if lane == 0 {
            return Cond::Al;
        }
        Cond::from_bits((lane ^ 0xe0) >> 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_in_block() {
        let it = ItState::NONE;
        assert!(!it.in_block());
        assert_eq!(it.current_cond(), Cond::Al);
    }

    #[test]
    fn test_single_it_eq() {
        // IT EQ
        let it = ItState::from_it(0b0000, 0b1000).unwrap();
        assert!(it.is_last());
        assert_eq!(it.current_cond(), Cond::Eq);
        assert!(!it.advance().in_block());
    }

    #[test]
    fn test_itte_sequence() {
        // ITTE EQ: mask 0b0110 gives EQ, EQ, NE
        let mut it = ItState::from_it(0b0000, 0b0110).unwrap();
        let mut conds = Vec::new();
        while it.in_block() {
            conds.push(it.current_cond());
            it = it.advance();
        }
        assert_eq!(conds, vec![Cond::Eq, Cond::Eq, Cond::Ne]);
    }

    #[test]
    fn test_four_slot_block() {
        // ITETE GT: mask for GT (firstcond bit0 = 0) with T,E,T,E pattern
        let it = ItState::from_it(0b1100, 0b1011).unwrap();
        let conds: Vec<_> = (0..4)
            .scan(it, |s, _| {
                let c = s.current_cond();
                *s = s.advance();
                Some(c)
            })
            .collect();
        assert_eq!(conds, vec![Cond::Gt, Cond::Le, Cond::Gt, Cond::Le]);
        assert!(it.advance().advance().advance().is_last());
        assert!(!it.advance().advance().advance().advance().in_block());
    }

    #[test]
    fn test_al_block_lane_reads_always() {
        let it = ItState::from_it(0b1110, 0b1000).unwrap();
        assert_eq!(it.raw() & 0xf0, 0);
        assert!(it.in_block());
        assert_eq!(it.current_cond(), Cond::Al);
    }

    #[test]
    fn test_rejects_invalid() {
        assert_eq!(ItState::from_it(0b1111, 0b1000), None);
        assert_eq!(ItState::from_it(0b0000, 0b0000), None);
        // ITE AL would need an NV slot; ITT AL is fine.
        assert_eq!(ItState::from_it(0b1110, 0b1100), None);
        assert!(ItState::from_it(0b1110, 0b0100).is_some());
    }
}
