//! Multiply and multiply-accumulate, 32- and 64-bit.

use super::is_unconditional;
use crate::bits::{bit, field, reg};
use crate::context::DecodeContext;
use crate::families::alu::{LongMul, MulAcc, emit_mul, emit_mul_long};
use crate::families::{InstructionFamily, Outcome};
use crate::types::REG_PC;

pub struct A32Multiply;

impl InstructionFamily for A32Multiply {
    fn name(&self) -> &'static str {
        "a32-multiply"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if is_unconditional(insn) || field(insn, 27, 24) != 0 || field(insn, 7, 4) != 0b1001 {
            return Outcome::NotMatched;
        }
        let op = field(insn, 23, 21);
        let s = bit(insn, 20);
        let (rd_hi, ra_lo, rm, rn) = (reg(insn, 16), reg(insn, 12), reg(insn, 8), reg(insn, 0));
        let flags = s.then_some(ctx.guard);

        if [rd_hi, rm, rn].contains(&REG_PC) {
            return Outcome::Undefined;
        }

        match op {
            0b000 => emit_mul(ctx, rd_hi, rn, rm, MulAcc::None, flags),
            0b001 | 0b011 => {
                if ra_lo == REG_PC {
                    return Outcome::Undefined;
                }
                let acc = if op == 0b001 {
                    MulAcc::Add(ra_lo)
                } else {
                    // MLS has no flag-setting form
                    if !ctx.arch().has_v6t2() || s {
                        return Outcome::Undefined;
                    }
                    MulAcc::Sub(ra_lo)
                };
                emit_mul(ctx, rd_hi, rn, rm, acc, flags);
            }
            _ => {
                let Some(kind) = LongMul::from_a32(op) else {
                    return Outcome::Undefined;
                };
                if ra_lo == REG_PC || ra_lo == rd_hi {
                    return Outcome::Undefined;
                }
                if kind == LongMul::Umaal && (s || !ctx.arch().has_v6()) {
                    return Outcome::Undefined;
                }
                emit_mul_long(ctx, kind, ra_lo, rd_hi, rn, rm, flags);
            }
        }
        Outcome::Lifted
    }
}
