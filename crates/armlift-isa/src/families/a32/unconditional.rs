//! The `cond == 0b1111` space: BLX (immediate), preloads, barriers.

use armlift_ir::{Expr, JumpKind, Stmt};

use super::is_unconditional;
use crate::bits::{bit, field, matches, sign_extend};
use crate::context::DecodeContext;
use crate::families::control::emit_direct_branch;
use crate::families::{InstructionFamily, Outcome};
use crate::guard::Guard;
use crate::types::REG_LR;

pub struct A32Unconditional;

/// Advanced SIMD data processing and element load/store live in this space
/// and belong to coprocessor families.
const fn is_simd_space(insn: u32) -> bool {
    matches(insn, 0xfe00_0000, 0xf200_0000) || matches(insn, 0xff10_0000, 0xf400_0000)
}

impl InstructionFamily for A32Unconditional {
    fn name(&self) -> &'static str {
        "a32-unconditional"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if !is_unconditional(insn) || is_simd_space(insn) {
            return Outcome::NotMatched;
        }

        // BLX <imm>: always switches to Thumb
        if field(insn, 27, 25) == 0b101 {
            if !ctx.arch().has_v5te() {
                return Outcome::Undefined;
            }
            let h = u32::from(bit(insn, 24));
            let offset = sign_extend((field(insn, 23, 0) << 2) | (h << 1), 26);
            let dst = ctx.pc_operand().wrapping_add(offset) | 1;
            let lr = ctx.next_pc();
            ctx.put_reg(REG_LR, Expr::u32(lr), Guard::Always);
            emit_direct_branch(ctx, dst, JumpKind::Call);
            return Outcome::Lifted;
        }

        // PLD, PLDW, PLI
        if field(insn, 27, 26) == 0b01 && field(insn, 21, 20) == 0b01 {
            if bit(insn, 25) && bit(insn, 4) {
                return Outcome::Undefined;
            }
            return Outcome::Lifted;
        }

        match insn {
            // CLREX: no exclusive monitor is modelled
            0xf57f_f01f => Outcome::Lifted,
            _ if matches(insn, 0xffff_fff0, 0xf57f_f040)
                || matches(insn, 0xffff_fff0, 0xf57f_f050)
                || matches(insn, 0xffff_fff0, 0xf57f_f060) =>
            {
                // DSB, DMB, ISB
                ctx.stmt(Stmt::Fence);
                Outcome::Lifted
            }
            _ => Outcome::Undefined,
        }
    }
}
