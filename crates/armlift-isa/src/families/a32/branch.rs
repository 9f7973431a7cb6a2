//! B and BL.

use armlift_ir::{Expr, JumpKind};

use super::is_unconditional;
use crate::bits::{bit, field, sign_extend};
use crate::context::DecodeContext;
use crate::families::control::emit_direct_branch;
use crate::families::{InstructionFamily, Outcome};
use crate::types::REG_LR;

pub struct A32Branch;

impl InstructionFamily for A32Branch {
    fn name(&self) -> &'static str {
        "a32-branch"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if is_unconditional(insn) || field(insn, 27, 25) != 0b101 {
            return Outcome::NotMatched;
        }
        let offset = sign_extend(field(insn, 23, 0) << 2, 26);
        let dst = ctx.pc_operand().wrapping_add(offset);
        let jk = if bit(insn, 24) {
            let lr = ctx.next_pc();
            let guard = ctx.guard;
            ctx.put_reg(REG_LR, Expr::u32(lr), guard);
            JumpKind::Call
        } else {
            JumpKind::Boring
        };
        emit_direct_branch(ctx, dst, jk);
        Outcome::Lifted
    }
}
