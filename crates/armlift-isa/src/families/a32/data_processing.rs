//! Data-processing (register, register-shifted register, immediate),
//! MOVW/MOVT and the hint instructions.

use armlift_ir::{Expr, JumpKind};

use super::is_unconditional;
use crate::bits::{bit, field, matches, reg};
use crate::context::DecodeContext;
use crate::families::alu::{DpOp, emit_dp};
use crate::families::control::emit_yield;
use crate::families::{InstructionFamily, Outcome};
use crate::shifter::{ShifterOperand, Shifted, eval_operand};
use crate::types::{REG_LR, REG_PC, ShiftKind};

pub struct A32DataProcessing;

impl InstructionFamily for A32DataProcessing {
    fn name(&self) -> &'static str {
        "a32-data-processing"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if is_unconditional(insn) || field(insn, 27, 26) != 0 {
            return Outcome::NotMatched;
        }
        let imm_form = bit(insn, 25);
        // multiplies and extra loads/stores
        if !imm_form && bit(insn, 7) && bit(insn, 4) {
            return Outcome::NotMatched;
        }
        let opc = field(insn, 24, 21);
        let s = bit(insn, 20);
        if opc >> 2 == 0b10 && !s {
            return if imm_form {
                movw_movt_hint(ctx, insn)
            } else {
                Outcome::NotMatched
            };
        }

        let op = DpOp::from_a32(opc);
        let (rn, rd) = (reg(insn, 16), reg(insn, 12));
        let shifter = ShifterOperand::decode_a32(insn);
        if let ShifterOperand::RegShift { rm, rs, .. } = shifter {
            if [rn, rd, rm, rs].contains(&REG_PC) {
                return Outcome::Undefined;
            }
        }
        // exception return forms
        if rd == REG_PC && s && !op.is_test() {
            return Outcome::Undefined;
        }

        let rn_value = if op.uses_rn() {
            ctx.read_reg(rn)
        } else {
            Expr::u32(0)
        };
        let operand: Shifted = eval_operand(ctx, shifter, s && op.is_logical());
        let is_ret = op == DpOp::Mov
            && shifter
                == ShifterOperand::ImmShift {
                    rm: REG_LR,
                    kind: ShiftKind::Lsl,
                    imm5: 0,
                };
        let jk = if is_ret {
            JumpKind::Ret
        } else {
            JumpKind::Boring
        };
        let flag_guard = s.then_some(ctx.guard);
        emit_dp(ctx, op, rd, rn_value, operand, flag_guard, jk);
        Outcome::Lifted
    }
}

/// The `0011 0xx0` immediate space: MOVW, MOVT and hints.
fn movw_movt_hint(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    if matches(insn, 0x0fff_ff00, 0x0320_f000) {
        return match field(insn, 7, 0) {
            // NOP, WFE, WFI, SEV
            0 | 2 | 3 | 4 => Outcome::Lifted,
            1 => {
                emit_yield(ctx);
                Outcome::Lifted
            }
            _ => Outcome::NotMatched,
        };
    }
    let is_movw = match field(insn, 24, 20) {
        0b10000 => true,
        0b10100 => false,
        _ => return Outcome::NotMatched,
    };
    let rd = reg(insn, 12);
    if !ctx.arch().has_v6t2() || rd == REG_PC {
        return Outcome::Undefined;
    }
    let imm16 = (field(insn, 19, 16) << 12) | field(insn, 11, 0);
    let value = if is_movw {
        Expr::u32(imm16)
    } else {
        let old = ctx.read_reg(rd);
        Expr::or32(Expr::and32(old, Expr::u32(0xffff)), Expr::u32(imm16 << 16))
    };
    let guard = ctx.guard;
    ctx.put_reg(rd, value, guard);
    Outcome::Lifted
}
