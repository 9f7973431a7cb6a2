//! Barrel shifter.
//!
//! Produces the second operand of data-processing instructions together
//! with the shifter carry-out, in three forms: rotated immediate, register
//! shifted by an immediate, and register shifted by a register.

use armlift_ir::{BinOp, Expr, Temp};

use crate::bits::{bit, field, reg};
use crate::context::DecodeContext;
use crate::flags;
use crate::types::ShiftKind;

/// Encoded shifter operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShifterOperand {
    /// `imm8` rotated right by `2 * rot`.
    Imm { imm8: u32, rot: u32 },
    /// `Rm, <kind> #imm5` with the A32 encoding of `imm5`.
    ImmShift { rm: u8, kind: ShiftKind, imm5: u8 },
    /// `Rm, <kind> Rs`.
    RegShift { rm: u8, kind: ShiftKind, rs: u8 },
}

impl ShifterOperand {
    /// Decode bits 25 and 11:0 of an A32 data-processing instruction.
    pub const fn decode_a32(insn: u32) -> Self {
        let kind = ShiftKind::from_bits(field(insn, 6, 5));
        if bit(insn, 25) {
            Self::Imm {
                imm8: field(insn, 7, 0),
                rot: field(insn, 11, 8),
            }
        } else if bit(insn, 4) {
            Self::RegShift {
                rm: reg(insn, 0),
                kind,
                rs: reg(insn, 8),
            }
        } else {
            Self::ImmShift {
                rm: reg(insn, 0),
                kind,
                imm5: field(insn, 11, 7) as u8,
            }
        }
    }
}

/// Amount for [`eval_shift`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftAmount {
    /// Encoded `imm5`: `LSR #0` and `ASR #0` mean 32, `ROR #0` is RRX.
    Imm(u8),
    /// Register value; only the bottom byte counts.
    Reg(Temp),
}

/// Shifter result. Both fields are atoms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shifted {
    pub value: Expr,
    /// Carry-out as 0 or 1, when requested.
    pub carry: Option<Expr>,
}

/// Rotated A32 immediate.
pub const fn arm_expand_imm(imm12: u32) -> u32 {
    (imm12 & 0xff).rotate_right(2 * ((imm12 >> 8) & 0xf))
}

/// Rotated A32 immediate and its carry-out; `None` leaves C unchanged.
pub const fn arm_expand_imm_c(imm12: u32) -> (u32, Option<bool>) {
    let value = arm_expand_imm(imm12);
    if (imm12 >> 8) & 0xf == 0 {
        (value, None)
    } else {
        (value, Some(value >> 31 != 0))
    }
}

/// Thumb modified immediate and its carry-out; `None` when the encoding
/// is unpredictable.
pub const fn thumb_expand_imm_c(imm12: u32) -> Option<(u32, Option<bool>)> {
    let imm8 = imm12 & 0xff;
    if (imm12 >> 10) & 3 == 0 {
        let value = match (imm12 >> 8) & 3 {
            0 => return Some((imm8, None)),
            1 => imm8 | (imm8 << 16),
            2 => (imm8 << 8) | (imm8 << 24),
            _ => imm8 * 0x0101_0101,
        };
        if imm8 == 0 {
            return None;
        }
        Some((value, None))
    } else {
        let value = (0x80 | (imm12 & 0x7f)).rotate_right((imm12 >> 7) & 0x1f);
        Some((value, Some(value >> 31 != 0)))
    }
}

/// Architectural shift amount of an encoded `imm5`.
pub const fn imm_shift_amount(kind: ShiftKind, imm5: u8) -> u32 {
    match (kind, imm5) {
        (ShiftKind::Lsr | ShiftKind::Asr, 0) => 32,
        _ => imm5 as u32,
    }
}

/// Shift `value` by `amount` (0..=255) with carry-in, as executed.
pub const fn shift_c(kind: ShiftKind, value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    if amount == 0 {
        return (value, carry_in);
    }
    match kind {
        ShiftKind::Lsl => match amount {
            1..=31 => (value << amount, (value >> (32 - amount)) & 1 != 0),
            32 => (0, value & 1 != 0),
            _ => (0, false),
        },
        ShiftKind::Lsr => match amount {
            1..=31 => (value >> amount, (value >> (amount - 1)) & 1 != 0),
            32 => (0, value >> 31 != 0),
            _ => (0, false),
        },
        ShiftKind::Asr => {
            if amount < 32 {
                (
                    ((value as i32) >> amount) as u32,
                    (value >> (amount - 1)) & 1 != 0,
                )
            } else {
                (((value as i32) >> 31) as u32, value >> 31 != 0)
            }
        }
        ShiftKind::Ror => {
            let r = value.rotate_right(amount & 31);
            (r, r >> 31 != 0)
        }
    }
}

/// Rotate right with extend.
pub const fn rrx_c(value: u32, carry_in: bool) -> (u32, bool) {
    ((value >> 1) | ((carry_in as u32) << 31), value & 1 != 0)
}

fn carry_of(ctx: &mut DecodeContext<'_>, carry: Option<bool>) -> Expr {
    match carry {
        Some(c) => Expr::u32(u32::from(c)),
        None => flags::old_c(ctx),
    }
}

/// Evaluate a shifter operand.
pub fn eval_operand(ctx: &mut DecodeContext<'_>, op: ShifterOperand, want_carry: bool) -> Shifted {
    match op {
        ShifterOperand::Imm { imm8, rot } => {
            let (value, carry) = arm_expand_imm_c((rot << 8) | imm8);
            Shifted {
                value: Expr::u32(value),
                carry: want_carry.then(|| carry_of(ctx, carry)),
            }
        }
        ShifterOperand::ImmShift { rm, kind, imm5 } => {
            let value = ctx.read_reg(rm);
            eval_shift(ctx, kind, value, ShiftAmount::Imm(imm5), want_carry)
        }
        ShifterOperand::RegShift { rm, kind, rs } => {
            let value = ctx.read_reg(rm);
            let amount = ctx.read_reg_tmp(rs);
            eval_shift(ctx, kind, value, ShiftAmount::Reg(amount), want_carry)
        }
    }
}

/// Materialise a modified immediate, reading the old carry only when it
/// passes through.
pub fn imm_operand(
    ctx: &mut DecodeContext<'_>,
    (value, carry): (u32, Option<bool>),
    want_carry: bool,
) -> Shifted {
    Shifted {
        value: Expr::u32(value),
        carry: want_carry.then(|| carry_of(ctx, carry)),
    }
}

/// Shift an atom `value`.
pub fn eval_shift(
    ctx: &mut DecodeContext<'_>,
    kind: ShiftKind,
    value: Expr,
    amount: ShiftAmount,
    want_carry: bool,
) -> Shifted {
    let (value, carry) = match amount {
        ShiftAmount::Imm(imm5) => shift_by_imm(ctx, kind, value, imm5, want_carry),
        ShiftAmount::Reg(rs) => shift_by_reg(ctx, kind, value, rs, want_carry),
    };
    let value = ctx.atom(value);
    let carry = carry.map(|c| ctx.atom(c));
    Shifted { value, carry }
}

fn shift_by_imm(
    ctx: &mut DecodeContext<'_>,
    kind: ShiftKind,
    v: Expr,
    imm5: u8,
    want_carry: bool,
) -> (Expr, Option<Expr>) {
    let n = imm5 & 31;
    match (kind, n) {
        (ShiftKind::Lsl, 0) => {
            let carry = want_carry.then(|| flags::old_c(ctx));
            (v, carry)
        }
        (ShiftKind::Lsl, _) => (
            Expr::shl32(v.clone(), n),
            want_carry.then(|| Expr::bit32(v, 32 - n)),
        ),
        (ShiftKind::Lsr, 0) => (Expr::u32(0), want_carry.then(|| Expr::bit32(v, 31))),
        (ShiftKind::Lsr, _) => (
            Expr::shr32(v.clone(), n),
            want_carry.then(|| Expr::bit32(v, n - 1)),
        ),
        (ShiftKind::Asr, 0) => (
            Expr::sar32(v.clone(), 31),
            want_carry.then(|| Expr::bit32(v, 31)),
        ),
        (ShiftKind::Asr, _) => (
            Expr::sar32(v.clone(), n),
            want_carry.then(|| Expr::bit32(v, n - 1)),
        ),
        (ShiftKind::Ror, 0) => {
            // RRX
            let old_c = flags::old_c(ctx);
            let value = Expr::or32(Expr::shr32(v.clone(), 1), Expr::shl32(old_c, 31));
            (value, want_carry.then(|| Expr::bit32(v, 0)))
        }
        (ShiftKind::Ror, _) => (
            Expr::ror32(v.clone(), n),
            want_carry.then(|| Expr::bit32(v, n - 1)),
        ),
    }
}

fn shift_by_reg(
    ctx: &mut DecodeContext<'_>,
    kind: ShiftKind,
    v: Expr,
    rs: Temp,
    want_carry: bool,
) -> (Expr, Option<Expr>) {
    let amt = Expr::tmp(ctx.bind(Expr::and32(Expr::tmp(rs), Expr::u32(0xff))));
    let shifted = |op: BinOp, v: &Expr, e: Expr| Expr::binop(op, v.clone(), Expr::to8(e));
    let below_32 = Expr::cmp_lt32u(amt.clone(), Expr::u32(32));
    let is_zero = Expr::cmp_eq32(amt.clone(), Expr::u32(0));
    let within_32 = Expr::cmp_le32u(amt.clone(), Expr::u32(32));
    let bit0 = |e: Expr| Expr::and32(e, Expr::u32(1));

    let value = match kind {
        ShiftKind::Lsl => Expr::ite(below_32, shifted(BinOp::Shl32, &v, amt.clone()), Expr::u32(0)),
        ShiftKind::Lsr => Expr::ite(below_32, shifted(BinOp::Shr32, &v, amt.clone()), Expr::u32(0)),
        ShiftKind::Asr => Expr::ite(
            below_32,
            shifted(BinOp::Sar32, &v, amt.clone()),
            Expr::sar32(v.clone(), 31),
        ),
        ShiftKind::Ror => {
            let amt5 = Expr::tmp(ctx.bind(Expr::and32(amt.clone(), Expr::u32(31))));
            let rotated = Expr::or32(
                shifted(BinOp::Shr32, &v, amt5.clone()),
                shifted(BinOp::Shl32, &v, Expr::sub32(Expr::u32(32), amt5.clone())),
            );
            Expr::ite(Expr::cmp_eq32(amt5, Expr::u32(0)), v.clone(), rotated)
        }
    };
    if !want_carry {
        return (value, None);
    }
    let value = ctx.atom(value);
    let old_c = flags::old_c(ctx);
    let carry = match kind {
        ShiftKind::Lsl => Expr::ite(
            within_32,
            bit0(shifted(BinOp::Shr32, &v, Expr::sub32(Expr::u32(32), amt))),
            Expr::u32(0),
        ),
        ShiftKind::Lsr => Expr::ite(
            within_32,
            bit0(shifted(BinOp::Shr32, &v, Expr::sub32(amt, Expr::u32(1)))),
            Expr::u32(0),
        ),
        ShiftKind::Asr => Expr::ite(
            within_32,
            bit0(shifted(BinOp::Shr32, &v, Expr::sub32(amt, Expr::u32(1)))),
            Expr::bit32(v, 31),
        ),
        ShiftKind::Ror => Expr::bit32(value.clone(), 31),
    };
    (value, Some(Expr::ite(is_zero, old_c, carry)))
}

#[cfg(test)]
mod tests {
    use armlift_ir::{GuestState, Interp, IrBlock, JumpKind, Memory};
    use proptest::prelude::*;

    use super::*;
    use crate::config::{ArchInfo, LiftOptions};
    use crate::flags::FlagHelpers;
    use crate::guard::Guard;
    use crate::layout::{GUEST_STATE_SIZE, OFFB_CC_DEP1, OFFB_R15T, reg_offset};

    /// Lift `op` with R1 = `v`, R2 = `rs` and C = `cin`; return value and
    /// carry.
    fn run(op: ShifterOperand, v: u32, rs: u32, cin: bool) -> (u32, bool) {
        let mut block = IrBlock::new();
        let (arch, opts) = (ArchInfo::default(), LiftOptions::default());
        let never = |_: u32| false;
        {
            let mut ctx = DecodeContext::new(&mut block, &arch, &opts, &never, 0x1000, 4);
            let s = eval_operand(&mut ctx, op, true);
            ctx.put_reg(0, s.value, Guard::Always);
            ctx.put_reg(3, s.carry.expect("carry requested"), Guard::Always);
        }
        block.set_next(Expr::u32(0), JumpKind::Boring);

        let mut st = GuestState::new(GUEST_STATE_SIZE);
        st.set_u32(reg_offset(1), v).unwrap();
        st.set_u32(reg_offset(2), rs).unwrap();
        st.set_u32(OFFB_CC_DEP1, u32::from(cin) << 29).unwrap();
        Interp::new(OFFB_R15T, &FlagHelpers)
            .run(&block, &mut st, &mut Memory::new())
            .unwrap();
        (
            st.u32_at(reg_offset(0)).unwrap(),
            st.u32_at(reg_offset(3)).unwrap() != 0,
        )
    }

    fn kind_of(k: u32) -> ShiftKind {
        ShiftKind::from_bits(k)
    }

    #[test]
    fn test_decode_a32_forms() {
        // mov r0, #0xff000000
        assert_eq!(
            ShifterOperand::decode_a32(0xe3a004ff),
            ShifterOperand::Imm { imm8: 0xff, rot: 4 }
        );
        // mov r0, r1, lsl r2
        assert_eq!(
            ShifterOperand::decode_a32(0xe1a00211),
            ShifterOperand::RegShift {
                rm: 1,
                kind: ShiftKind::Lsl,
                rs: 2
            }
        );
        // mov r0, r1, asr #3
        assert_eq!(
            ShifterOperand::decode_a32(0xe1a001c1),
            ShifterOperand::ImmShift {
                rm: 1,
                kind: ShiftKind::Asr,
                imm5: 3
            }
        );
    }

    #[test]
    fn test_expand_imm() {
        assert_eq!(arm_expand_imm(0x4ff), 0xff00_0000);
        assert_eq!(arm_expand_imm_c(0x0ff), (0xff, None));
        assert_eq!(arm_expand_imm_c(0x102), (0x8000_0000, Some(true)));
        assert_eq!(thumb_expand_imm_c(0x0ab), Some((0xab, None)));
        assert_eq!(thumb_expand_imm_c(0x1ab), Some((0x00ab_00ab, None)));
        assert_eq!(thumb_expand_imm_c(0x2ab), Some((0xab00_ab00, None)));
        assert_eq!(thumb_expand_imm_c(0x3ab), Some((0xabab_abab, None)));
        assert_eq!(thumb_expand_imm_c(0x100), None);
        // 0x80 | 0x7f rotated right by 8
        assert_eq!(thumb_expand_imm_c(0x47f), Some((0xff00_0000, Some(true))));
    }

    #[test]
    fn test_lsr_zero_means_32() {
        let imm = ShifterOperand::ImmShift {
            rm: 1,
            kind: ShiftKind::Lsr,
            imm5: 0,
        };
        let by_reg = ShifterOperand::RegShift {
            rm: 1,
            kind: ShiftKind::Lsr,
            rs: 2,
        };
        assert_eq!(run(imm, 0x8000_0001, 0, false), (0, true));
        assert_eq!(run(by_reg, 0x8000_0001, 32, false), (0, true));
    }

    #[test]
    fn test_ror_zero_is_rrx() {
        let op = ShifterOperand::ImmShift {
            rm: 1,
            kind: ShiftKind::Ror,
            imm5: 0,
        };
        assert_eq!(run(op, 0x0000_0003, 0, true), (0x8000_0001, true));
        assert_eq!(run(op, 0x0000_0002, 0, false), (0x0000_0001, false));
    }

    #[test]
    fn test_register_shift_uses_bottom_byte() {
        let op = ShifterOperand::RegShift {
            rm: 1,
            kind: ShiftKind::Lsl,
            rs: 2,
        };
        assert_eq!(run(op, 1, 0x104, false), (0x10, false));
        // zero amount keeps the carry
        assert_eq!(run(op, 5, 0x100, true), (5, true));
    }

    #[test]
    fn test_immediate_without_rotation_keeps_carry() {
        let op = ShifterOperand::Imm { imm8: 0x12, rot: 0 };
        assert_eq!(run(op, 0, 0, true), (0x12, true));
        assert_eq!(run(op, 0, 0, false), (0x12, false));
    }

    proptest! {
        #[test]
        fn prop_imm_shift_matches_host(k in 0u32..4, imm5 in 0u8..32, v in any::<u32>(), cin in any::<bool>()) {
            let kind = kind_of(k);
            let op = ShifterOperand::ImmShift { rm: 1, kind, imm5 };
            let want = if kind == ShiftKind::Ror && imm5 == 0 {
                rrx_c(v, cin)
            } else {
                shift_c(kind, v, imm_shift_amount(kind, imm5), cin)
            };
            prop_assert_eq!(run(op, v, 0, cin), want);
        }

        #[test]
        fn prop_reg_shift_matches_host(
            k in 0u32..4,
            rs in prop_oneof![0u32..70, any::<u32>()],
            v in any::<u32>(),
            cin in any::<bool>(),
        ) {
            let kind = kind_of(k);
            let op = ShifterOperand::RegShift { rm: 1, kind, rs: 2 };
            prop_assert_eq!(run(op, v, rs, cin), shift_c(kind, v, rs & 0xff, cin));
        }
    }
}
