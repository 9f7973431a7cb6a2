//! 32-bit Thumb data processing: modified immediate, plain binary
//! immediate, shifted register, register-shifted MOV, multiplies and CLZ.

use armlift_ir::{Expr, JumpKind};

use super::is_bad_reg;
use crate::bits::{bit, field, matches, reg};
use crate::context::DecodeContext;
use crate::families::alu::{DpOp, LongMul, MulAcc, emit_clz, emit_dp, emit_mul, emit_mul_long};
use crate::families::{InstructionFamily, Outcome};
use crate::shifter::{ShifterOperand, Shifted, eval_operand, imm_operand, thumb_expand_imm_c};
use crate::types::{REG_PC, REG_SP, ShiftKind};

pub struct T32Alu;

impl InstructionFamily for T32Alu {
    fn name(&self) -> &'static str {
        "t32-alu"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if matches(insn, 0xfa00_8000, 0xf000_0000) {
            modified_immediate(ctx, insn)
        } else if matches(insn, 0xfa00_8000, 0xf200_0000) {
            plain_immediate(ctx, insn)
        } else if matches(insn, 0xfe00_0000, 0xea00_0000) {
            shifted_register(ctx, insn)
        } else if matches(insn, 0xff80_f0f0, 0xfa00_f000) {
            register_shift_mov(ctx, insn)
        } else if matches(insn, 0xfff0_f0f0, 0xfab0_f080) {
            let (rd, rm) = (reg(insn, 8), reg(insn, 0));
            if reg(insn, 16) != rm || is_bad_reg(rd) || is_bad_reg(rm) {
                return Outcome::Undefined;
            }
            emit_clz(ctx, rd, rm);
            Outcome::Lifted
        } else if matches(insn, 0xff80_0000, 0xfb00_0000) {
            multiply(ctx, insn)
        } else if matches(insn, 0xff80_0000, 0xfb80_0000) {
            long_multiply(ctx, insn)
        } else {
            Outcome::NotMatched
        }
    }
}

/// Apply the `Rd == PC` (test) and `Rn == PC` (move) aliases.
const fn alias(op: DpOp, rd: u8, rn: u8, s: bool) -> DpOp {
    if rd == REG_PC && s {
        if let Some(test) = op.as_test() {
            return test;
        }
    }
    match (op, rn) {
        (DpOp::Orr, REG_PC) => DpOp::Mov,
        (DpOp::Orn, REG_PC) => DpOp::Mvn,
        _ => op,
    }
}

/// Register constraints shared by the immediate and register forms: PC is
/// never an operand, and SP only as the base and destination of ADD/SUB.
const fn regs_ok(op: DpOp, rd: u8, rn: u8) -> bool {
    let sp_arith = matches!(op, DpOp::Add | DpOp::Sub | DpOp::Cmp | DpOp::Cmn) && rn == REG_SP;
    if op.uses_rn() && rn == REG_PC {
        return false;
    }
    if op.uses_rn() && rn == REG_SP && !sp_arith {
        return false;
    }
    if op.is_test() {
        return true;
    }
    rd != REG_PC && (rd != REG_SP || sp_arith)
}

fn finish_dp(
    ctx: &mut DecodeContext<'_>,
    op: DpOp,
    rd: u8,
    rn: u8,
    s: bool,
    operand: impl FnOnce(&mut DecodeContext<'_>, bool) -> Shifted,
) -> Outcome {
    let rn_value = if op.uses_rn() {
        ctx.read_reg(rn)
    } else {
        Expr::u32(0)
    };
    let operand = operand(ctx, s && op.is_logical());
    let flag_guard = s.then_some(ctx.guard);
    emit_dp(ctx, op, rd, rn_value, operand, flag_guard, JumpKind::Boring);
    Outcome::Lifted
}

/// `11110 i 0 op S Rn | 0 imm3 Rd imm8`
fn modified_immediate(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let (rn, rd, s) = (reg(insn, 16), reg(insn, 8), bit(insn, 20));
    let imm12 = field(insn, 26, 26) << 11 | field(insn, 14, 12) << 8 | field(insn, 7, 0);
    let Some(expanded) = thumb_expand_imm_c(imm12) else {
        return Outcome::Undefined;
    };
    let Some(op) = DpOp::from_t32(field(insn, 24, 21)) else {
        return Outcome::Undefined;
    };
    let op = alias(op, rd, rn, s);
    if !regs_ok(op, rd, rn) {
        return Outcome::Undefined;
    }
    finish_dp(ctx, op, rd, rn, s, |ctx, carry| imm_operand(ctx, expanded, carry))
}

/// `11110 i 1 op Rn | 0 imm3 Rd imm8`: ADDW, SUBW, ADR, MOVW, MOVT.
fn plain_immediate(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let (rn, rd) = (reg(insn, 16), reg(insn, 8));
    let imm12 = field(insn, 26, 26) << 11 | field(insn, 14, 12) << 8 | field(insn, 7, 0);
    let imm16 = field(insn, 19, 16) << 12 | imm12;
    let op = field(insn, 24, 20);
    let guard = ctx.guard;
    match op {
        0b00000 | 0b01010 => {
            let sub = op == 0b01010;
            if rd == REG_PC || (rd == REG_SP && rn != REG_SP) {
                return Outcome::Undefined;
            }
            let value = if rn == REG_PC {
                // ADR
                let base = ctx.pc_operand() & !3;
                Expr::u32(if sub {
                    base.wrapping_sub(imm12)
                } else {
                    base.wrapping_add(imm12)
                })
            } else {
                let base = ctx.read_reg(rn);
                if sub {
                    Expr::sub32(base, Expr::u32(imm12))
                } else {
                    Expr::add32(base, Expr::u32(imm12))
                }
            };
            ctx.put_reg(rd, value, guard);
        }
        // MOVW
        0b00100 => {
            if is_bad_reg(rd) {
                return Outcome::Undefined;
            }
            ctx.put_reg(rd, Expr::u32(imm16), guard);
        }
        // MOVT
        0b01100 => {
            if is_bad_reg(rd) {
                return Outcome::Undefined;
            }
            let low = Expr::and32(ctx.read_reg(rd), Expr::u32(0xffff));
            ctx.put_reg(rd, Expr::or32(low, Expr::u32(imm16 << 16)), guard);
        }
        _ => return Outcome::NotMatched,
    }
    Outcome::Lifted
}

/// `1110101 op S Rn | 0 imm3 Rd imm2 type Rm`
fn shifted_register(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let Some(op) = DpOp::from_t32(field(insn, 24, 21)) else {
        return Outcome::NotMatched;
    };
    if bit(insn, 15) {
        return Outcome::Undefined;
    }
    let (rn, rd, rm, s) = (reg(insn, 16), reg(insn, 8), reg(insn, 0), bit(insn, 20));
    let op = alias(op, rd, rn, s);
    let kind = ShiftKind::from_bits(field(insn, 5, 4));
    let imm5 = (field(insn, 14, 12) << 2 | field(insn, 7, 6)) as u8;
    // MOV.W Rd, SP is the one form that takes SP as the second operand
    let plain_move = op == DpOp::Mov && imm5 == 0 && kind == ShiftKind::Lsl;
    if rm == REG_PC || (rm == REG_SP && !plain_move) || !regs_ok(op, rd, rn) {
        return Outcome::Undefined;
    }
    let shifter = ShifterOperand::ImmShift { rm, kind, imm5 };
    finish_dp(ctx, op, rd, rn, s, |ctx, carry| eval_operand(ctx, shifter, carry))
}

/// `11111010 0 type S Rm | 1111 Rd 0000 Rs`: LSL, LSR, ASR, ROR by register.
fn register_shift_mov(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let (rm, rd, rs, s) = (reg(insn, 16), reg(insn, 8), reg(insn, 0), bit(insn, 20));
    if is_bad_reg(rd) || is_bad_reg(rm) || is_bad_reg(rs) {
        return Outcome::Undefined;
    }
    let kind = ShiftKind::from_bits(field(insn, 22, 21));
    let shifter = ShifterOperand::RegShift { rm, kind, rs };
    finish_dp(ctx, DpOp::Mov, rd, REG_PC, s, |ctx, carry| eval_operand(ctx, shifter, carry))
}

/// `11111 0110 op1 Rn | Ra Rd op2 Rm`: MUL, MLA, MLS.
fn multiply(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let (rn, ra, rd, rm) = (reg(insn, 16), reg(insn, 12), reg(insn, 8), reg(insn, 0));
    let acc = match (field(insn, 22, 20), field(insn, 7, 4)) {
        (0b000, 0b0000) if ra == REG_PC => MulAcc::None,
        (0b000, 0b0000) => MulAcc::Add(ra),
        (0b000, 0b0001) => MulAcc::Sub(ra),
        _ => return Outcome::NotMatched,
    };
    let ra_bad = match acc {
        MulAcc::None => false,
        MulAcc::Add(r) | MulAcc::Sub(r) => is_bad_reg(r),
    };
    if is_bad_reg(rd) || is_bad_reg(rn) || is_bad_reg(rm) || ra_bad {
        return Outcome::Undefined;
    }
    emit_mul(ctx, rd, rn, rm, acc, None);
    Outcome::Lifted
}

/// `11111 0111 op1 Rn | RdLo RdHi op2 Rm`: SMULL, UMULL, SMLAL, UMLAL,
/// UMAAL.
fn long_multiply(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let kind = match (field(insn, 22, 20), field(insn, 7, 4)) {
        (0b000, 0b0000) => LongMul::Smull,
        (0b010, 0b0000) => LongMul::Umull,
        (0b100, 0b0000) => LongMul::Smlal,
        (0b110, 0b0000) => LongMul::Umlal,
        (0b110, 0b0110) => LongMul::Umaal,
        _ => return Outcome::NotMatched,
    };
    let (rn, rdlo, rdhi, rm) = (reg(insn, 16), reg(insn, 12), reg(insn, 8), reg(insn, 0));
    if [rn, rdlo, rdhi, rm].into_iter().any(is_bad_reg) || rdlo == rdhi {
        return Outcome::Undefined;
    }
    emit_mul_long(ctx, kind, rdlo, rdhi, rn, rm, None);
    Outcome::Lifted
}
