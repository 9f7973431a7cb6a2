//! Bit-field extraction helpers for instruction words.

/// Bits `[hi:lo]` of `insn`, right-aligned.
#[inline]
pub const fn field(insn: u32, hi: u32, lo: u32) -> u32 {
    (insn >> lo) & ((1u32 << (hi - lo)) << 1).wrapping_sub(1)
}

/// Bit `n` of `insn`.
#[inline]
pub const fn bit(insn: u32, n: u32) -> bool {
    (insn >> n) & 1 != 0
}

/// 4-bit register number whose lowest bit is at `lo`.
#[inline]
pub const fn reg(insn: u32, lo: u32) -> u8 {
    ((insn >> lo) & 0xf) as u8
}

/// 3-bit (low) register number whose lowest bit is at `lo`.
#[inline]
pub const fn lo_reg(insn: u32, lo: u32) -> u8 {
    ((insn >> lo) & 0x7) as u8
}

/// Sign-extend the low `bits` bits of `value`.
#[inline]
pub const fn sign_extend(value: u32, bits: u32) -> u32 {
    let shift = 32 - bits;
    (((value << shift) as i32) >> shift) as u32
}

/// Check `insn & mask == value`.
#[inline]
pub const fn matches(insn: u32, mask: u32, value: u32) -> bool {
    insn & mask == value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field() {
        assert_eq!(field(0xE092_1003, 31, 28), 0xE);
        assert_eq!(field(0xE092_1003, 24, 21), 0b0100);
        assert_eq!(field(0xffff_ffff, 31, 0), 0xffff_ffff);
        assert_eq!(reg(0xE092_1003, 16), 2);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x80_0000, 24), 0xff80_0000);
        assert_eq!(sign_extend(0x7f_ffff, 24), 0x7f_ffff);
        assert_eq!(sign_extend(0x1, 1), 0xffff_ffff);
    }
}
