//! Guest state layout.
//!
//! Byte offsets of every slot in the guest state block. All integer slots
//! are 32 bits wide; `D0..D31` are 64 bits.

pub const OFFB_R0: u32 = 0;
/// R15 with the Thumb bit in bit 0.
pub const OFFB_R15T: u32 = 60;

/// Lazy flags thunk.
pub const OFFB_CC_OP: u32 = 64;
pub const OFFB_CC_DEP1: u32 = 68;
pub const OFFB_CC_DEP2: u32 = 72;
pub const OFFB_CC_NDEP: u32 = 76;

/// Sticky saturation flag; any nonzero value means set.
pub const OFFB_QFLAG32: u32 = 80;
pub const OFFB_GEFLAG0: u32 = 84;
pub const OFFB_GEFLAG1: u32 = 88;
pub const OFFB_GEFLAG2: u32 = 92;
pub const OFFB_GEFLAG3: u32 = 96;

/// Range to invalidate on an `InvalICache` exit.
pub const OFFB_CMSTART: u32 = 104;
pub const OFFB_CMLEN: u32 = 108;
/// Non-redirected address of the current function wrapper.
pub const OFFB_NRADDR: u32 = 112;

pub const OFFB_D0: u32 = 128;
/// Only bit 27, the sticky SIMD saturation flag QC, is written.
pub const OFFB_FPSCR: u32 = OFFB_D0 + 32 * 8;
/// User thread ID registers, read-only and read-write.
pub const OFFB_TPIDRURO: u32 = OFFB_FPSCR + 4;
pub const OFFB_TPIDRURW: u32 = OFFB_FPSCR + 8;
/// Packed IT block state, see `it_state`.
pub const OFFB_ITSTATE: u32 = OFFB_FPSCR + 12;

/// Total size of the guest state in bytes.
pub const GUEST_STATE_SIZE: usize = (OFFB_ITSTATE + 4) as usize;

/// Offset of core register `r`.
#[inline]
pub const fn reg_offset(r: u8) -> u32 {
    OFFB_R0 + 4 * (r & 15) as u32
}

/// Offset of 64-bit register `Dn`.
#[inline]
pub const fn dreg_offset(n: u8) -> u32 {
    OFFB_D0 + 8 * (n & 31) as u32
}

/// Offset of the GE flag for byte lane `lane` (0..4).
#[inline]
pub const fn ge_offset(lane: u8) -> u32 {
    OFFB_GEFLAG0 + 4 * (lane & 3) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_dense_and_aligned() {
        assert_eq!(reg_offset(15), OFFB_R15T);
        assert_eq!(dreg_offset(31) + 8, OFFB_FPSCR);
        assert_eq!(GUEST_STATE_SIZE, 400);
        assert_eq!(OFFB_D0 % 8, 0);
        assert_eq!(
            [1, 2, 3].map(ge_offset),
            [OFFB_GEFLAG1, OFFB_GEFLAG2, OFFB_GEFLAG3]
        );
    }
}
