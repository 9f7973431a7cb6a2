//! 16-bit Thumb data processing: shifts, add/subtract, move/compare
//! immediates, the register ALU group, high-register operations, address
//! generation, SP adjustment, extends and byte reversal.
//!
//! Flag-setting forms set flags only outside an IT block; compares always
//! do.

use armlift_ir::{Expr, JumpKind, UnOp};

use crate::bits::{field, lo_reg, matches};
use crate::context::DecodeContext;
use crate::families::alu::{DpOp, MulAcc, emit_dp, emit_mul};
use crate::families::{InstructionFamily, Outcome};
use crate::guard::{self, Guard};
use crate::shifter::{ShifterOperand, Shifted, eval_operand};
use crate::types::{REG_LR, REG_PC, REG_SP, ShiftKind};

pub struct T16Alu;

fn plain(value: Expr) -> Shifted {
    Shifted { value, carry: None }
}

impl InstructionFamily for T16Alu {
    fn name(&self) -> &'static str {
        "t16-alu"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        let hw = insn & 0xffff;
        match hw >> 11 {
            // LSL, LSR, ASR (immediate)
            0b00000..=0b00010 => {
                let shifter = ShifterOperand::ImmShift {
                    rm: lo_reg(hw, 3),
                    kind: ShiftKind::from_bits(field(hw, 12, 11)),
                    imm5: field(hw, 10, 6) as u8,
                };
                let flags = ctx.flag_guard;
                let operand = eval_operand(ctx, shifter, flags.is_some());
                emit_dp(ctx, DpOp::Mov, lo_reg(hw, 0), Expr::u32(0), operand, flags, JumpKind::Boring);
                Outcome::Lifted
            }
            // ADD, SUB (register or 3-bit immediate)
            0b00011 => {
                let rn = ctx.read_reg(lo_reg(hw, 3));
                let operand = if matches(hw, 1 << 10, 1 << 10) {
                    Expr::u32(field(hw, 8, 6))
                } else {
                    ctx.read_reg(lo_reg(hw, 6))
                };
                let op = if matches(hw, 1 << 9, 0) {
                    DpOp::Add
                } else {
                    DpOp::Sub
                };
                let flags = ctx.flag_guard;
                emit_dp(ctx, op, lo_reg(hw, 0), rn, plain(operand), flags, JumpKind::Boring);
                Outcome::Lifted
            }
            // MOV, CMP, ADD, SUB (8-bit immediate)
            0b00100..=0b00111 => {
                let rdn = lo_reg(hw, 8);
                let imm = plain(Expr::u32(field(hw, 7, 0)));
                let (op, flags) = match field(hw, 12, 11) {
                    0b00 => (DpOp::Mov, ctx.flag_guard),
                    0b01 => (DpOp::Cmp, Some(ctx.guard)),
                    0b10 => (DpOp::Add, ctx.flag_guard),
                    _ => (DpOp::Sub, ctx.flag_guard),
                };
                let rn = if op.uses_rn() {
                    ctx.read_reg(rdn)
                } else {
                    Expr::u32(0)
                };
                emit_dp(ctx, op, rdn, rn, imm, flags, JumpKind::Boring);
                Outcome::Lifted
            }
            0b01000 if field(hw, 10, 10) == 0 => {
                register_alu(ctx, hw);
                Outcome::Lifted
            }
            0b01000 if field(hw, 9, 8) != 0b11 => high_register(ctx, hw),
            // ADR, ADD (SP plus immediate)
            0b10100 | 0b10101 => {
                let rd = lo_reg(hw, 8);
                let imm = field(hw, 7, 0) << 2;
                let value = if matches(hw, 1 << 11, 0) {
                    Expr::u32((ctx.pc_operand() & !3).wrapping_add(imm))
                } else {
                    let sp = ctx.read_reg(REG_SP);
                    Expr::add32(sp, Expr::u32(imm))
                };
                let guard = ctx.guard;
                ctx.put_reg(rd, value, guard);
                Outcome::Lifted
            }
            0b10110 | 0b10111 => misc(ctx, hw),
            _ => Outcome::NotMatched,
        }
    }
}

/// `010000 op Rm Rdn`.
fn register_alu(ctx: &mut DecodeContext<'_>, hw: u32) {
    let rdn = lo_reg(hw, 0);
    let rm = lo_reg(hw, 3);
    let flags = ctx.flag_guard;
    let always = Some(ctx.guard);
    let shift = |kind| ShifterOperand::RegShift { rm: rdn, kind, rs: rm };
    let (op, shifted, flag_guard) = match field(hw, 9, 6) {
        0b0000 => (DpOp::And, None, flags),
        0b0001 => (DpOp::Eor, None, flags),
        0b0010 => (DpOp::Mov, Some(shift(ShiftKind::Lsl)), flags),
        0b0011 => (DpOp::Mov, Some(shift(ShiftKind::Lsr)), flags),
        0b0100 => (DpOp::Mov, Some(shift(ShiftKind::Asr)), flags),
        0b0101 => (DpOp::Adc, None, flags),
        0b0110 => (DpOp::Sbc, None, flags),
        0b0111 => (DpOp::Mov, Some(shift(ShiftKind::Ror)), flags),
        0b1000 => (DpOp::Tst, None, always),
        0b1001 => {
            // RSB Rd, Rn, #0
            let rn = ctx.read_reg(rm);
            emit_dp(ctx, DpOp::Rsb, rdn, rn, plain(Expr::u32(0)), flags, JumpKind::Boring);
            return;
        }
        0b1010 => (DpOp::Cmp, None, always),
        0b1011 => (DpOp::Cmn, None, always),
        0b1100 => (DpOp::Orr, None, flags),
        0b1101 => {
            emit_mul(ctx, rdn, rm, rdn, MulAcc::None, flags);
            return;
        }
        0b1110 => (DpOp::Bic, None, flags),
        _ => (DpOp::Mvn, None, flags),
    };
    let (rn, operand) = match shifted {
        Some(shifter) => (
            Expr::u32(0),
            eval_operand(ctx, shifter, flag_guard.is_some()),
        ),
        None => {
            let rn = if op.uses_rn() {
                ctx.read_reg(rdn)
            } else {
                Expr::u32(0)
            };
            (rn, plain(ctx.read_reg(rm)))
        }
    };
    emit_dp(ctx, op, rdn, rn, operand, flag_guard, JumpKind::Boring);
}

/// `010001 op D Rm Rdn`: ADD, CMP and MOV on any register.
fn high_register(ctx: &mut DecodeContext<'_>, hw: u32) -> Outcome {
    let rdn = (field(hw, 7, 7) << 3 | field(hw, 2, 0)) as u8;
    let rm = field(hw, 6, 3) as u8;
    match field(hw, 9, 8) {
        0b00 => {
            if rdn == REG_PC && rm == REG_PC {
                return Outcome::Undefined;
            }
            let a = ctx.read_reg(rdn);
            let b = ctx.read_reg(rm);
            write_any(ctx, rdn, Expr::add32(a, b), JumpKind::Boring);
        }
        0b01 => {
            if (rdn < 8 && rm < 8) || rdn == REG_PC || rm == REG_PC {
                return Outcome::Undefined;
            }
            let a = ctx.read_reg(rdn);
            let b = ctx.read_reg(rm);
            let guard = Some(ctx.guard);
            emit_dp(ctx, DpOp::Cmp, rdn, a, plain(b), guard, JumpKind::Boring);
        }
        _ => {
            let value = ctx.read_reg(rm);
            let jk = if rm == REG_LR {
                JumpKind::Ret
            } else {
                JumpKind::Boring
            };
            write_any(ctx, rdn, value, jk);
        }
    }
    Outcome::Lifted
}

/// Register write from a high-register op; PC stays in Thumb state.
fn write_any(ctx: &mut DecodeContext<'_>, rd: u8, value: Expr, jk: JumpKind) {
    let guard = ctx.guard;
    if rd == REG_PC {
        guard::sigill_if_in_but_not_last(ctx);
        ctx.write_pc(Expr::or32(value, Expr::u32(1)), guard, jk);
    } else {
        ctx.put_reg(rd, value, guard);
    }
}

/// The `1011` space handled here: SP adjustment, extends, byte reversal.
fn misc(ctx: &mut DecodeContext<'_>, hw: u32) -> Outcome {
    let guard = ctx.guard;
    // ADD/SUB SP, SP, #imm7 * 4
    if matches(hw, 0xff00, 0xb000) {
        let imm = Expr::u32(field(hw, 6, 0) << 2);
        let sp = ctx.read_reg(REG_SP);
        let value = if matches(hw, 0x80, 0) {
            Expr::add32(sp, imm)
        } else {
            Expr::sub32(sp, imm)
        };
        ctx.put_reg(REG_SP, value, guard);
        return Outcome::Lifted;
    }
    let extend = matches(hw, 0xff00, 0xb200);
    if !extend && !matches(hw, 0xff00, 0xba00) {
        return Outcome::NotMatched;
    }
    if !ctx.arch().has_v6() {
        return Outcome::Undefined;
    }
    let (rd, rm) = (lo_reg(hw, 0), lo_reg(hw, 3));
    let src = ctx.read_reg(rm);
    let value = if extend {
        // SXTH, SXTB, UXTH, UXTB
        match field(hw, 7, 6) {
            0b00 => Expr::unop(UnOp::Sext16To32, Expr::to16(src)),
            0b01 => Expr::unop(UnOp::Sext8To32, Expr::to8(src)),
            0b10 => Expr::unop(UnOp::Zext16To32, Expr::to16(src)),
            _ => Expr::unop(UnOp::Zext8To32, Expr::to8(src)),
        }
    } else {
        // REV, REV16, REVSH
        match field(hw, 7, 6) {
            0b00 => byte_reverse(src),
            0b01 => halfword_byte_reverse(src),
            0b11 => {
                let swapped = Expr::or32(
                    Expr::shl32(Expr::and32(src.clone(), Expr::u32(0xff)), 8),
                    Expr::and32(Expr::shr32(src, 8), Expr::u32(0xff)),
                );
                Expr::unop(UnOp::Sext16To32, Expr::to16(swapped))
            }
            _ => return Outcome::Undefined,
        }
    };
    ctx.put_reg(rd, value, guard);
    Outcome::Lifted
}

/// `REV`.
fn byte_reverse(src: Expr) -> Expr {
    let b = |shift_right: u8, shift_left: u8| {
        Expr::shl32(
            Expr::and32(Expr::shr32(src.clone(), shift_right), Expr::u32(0xff)),
            shift_left,
        )
    };
    Expr::or32(Expr::or32(b(24, 0), b(16, 8)), Expr::or32(b(8, 16), b(0, 24)))
}

/// `REV16`.
fn halfword_byte_reverse(src: Expr) -> Expr {
    let hi = Expr::and32(Expr::shl32(src.clone(), 8), Expr::u32(0xff00_ff00));
    let lo = Expr::and32(Expr::shr32(src, 8), Expr::u32(0x00ff_00ff));
    Expr::or32(hi, lo)
}
