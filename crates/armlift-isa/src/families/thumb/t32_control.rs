//! 32-bit Thumb branches and miscellaneous control: BL, BLX (immediate),
//! B.W, hints, barriers, MRS and MSR.

use armlift_ir::{Expr, JumpKind, Stmt};

use super::is_bad_reg;
use crate::bits::{bit, field, matches, reg, sign_extend};
use crate::context::DecodeContext;
use crate::families::alu::{read_apsr, write_apsr};
use crate::families::control::{emit_direct_branch, emit_yield};
use crate::families::{InstructionFamily, Outcome};
use crate::flags;
use crate::guard;
use crate::types::{Cond, REG_LR};

pub struct T32Control;

/// `S:I1:I2` prefix of the BL/BLX/B.W T4 offsets, at bits 24:22.
const fn high_offset_bits(insn: u32) -> u32 {
    let s = field(insn, 26, 26);
    let i1 = !(field(insn, 13, 13) ^ s) & 1;
    let i2 = !(field(insn, 11, 11) ^ s) & 1;
    s << 24 | i1 << 23 | i2 << 22
}

impl InstructionFamily for T32Control {
    fn name(&self) -> &'static str {
        "t32-control"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        // branches and miscellaneous control: 11110 ... | 1 op1 ...
        if !matches(insn, 0xf800_8000, 0xf000_8000) {
            return Outcome::NotMatched;
        }
        let imm10 = field(insn, 25, 16);
        match (bit(insn, 14), bit(insn, 12)) {
            // BL
            (true, true) => {
                guard::sigill_if_in_but_not_last(ctx);
                let offset = sign_extend(high_offset_bits(insn) | imm10 << 12 | field(insn, 10, 0) << 1, 25);
                let dst = ctx.pc_operand().wrapping_add(offset) | 1;
                link(ctx);
                emit_direct_branch(ctx, dst, JumpKind::Call);
                Outcome::Lifted
            }
            // BLX (immediate): target is A32
            (true, false) => {
                if bit(insn, 0) || !ctx.arch().has_v5te() {
                    return Outcome::Undefined;
                }
                guard::sigill_if_in_but_not_last(ctx);
                let offset = sign_extend(high_offset_bits(insn) | imm10 << 12 | field(insn, 10, 1) << 2, 25);
                let dst = (ctx.pc_operand() & !3).wrapping_add(offset);
                link(ctx);
                emit_direct_branch(ctx, dst, JumpKind::Call);
                Outcome::Lifted
            }
            // B.W (T4)
            (false, true) => {
                guard::sigill_if_in_but_not_last(ctx);
                let offset = sign_extend(high_offset_bits(insn) | imm10 << 12 | field(insn, 10, 0) << 1, 25);
                let dst = ctx.pc_operand().wrapping_add(offset) | 1;
                emit_direct_branch(ctx, dst, JumpKind::Boring);
                Outcome::Lifted
            }
            (false, false) if field(insn, 25, 23) != 0b111 => {
                // B<cond>.W (T3): S:J2:J1:imm6:imm11:0
                guard::sigill_if_in_it_block(ctx);
                ctx.guard = flags::condition(ctx, Cond::from_bits(field(insn, 25, 22)));
                let imm = field(insn, 26, 26) << 20
                    | field(insn, 11, 11) << 19
                    | field(insn, 13, 13) << 18
                    | field(insn, 21, 16) << 12
                    | field(insn, 10, 0) << 1;
                let dst = ctx.pc_operand().wrapping_add(sign_extend(imm, 21)) | 1;
                emit_direct_branch(ctx, dst, JumpKind::Boring);
                Outcome::Lifted
            }
            (false, false) => misc_control(ctx, insn),
        }
    }
}

/// `LR = next | 1`, under the instruction guard.
fn link(ctx: &mut DecodeContext<'_>) {
    let lr = ctx.next_pc_tagged();
    let guard = ctx.guard;
    ctx.put_reg(REG_LR, Expr::u32(lr), guard);
}

fn misc_control(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    // hints: NOP, YIELD, WFE, WFI, SEV
    if matches(insn, 0xffff_ff00, 0xf3af_8000) {
        if field(insn, 7, 0) == 1 {
            emit_yield(ctx);
        }
        return Outcome::Lifted;
    }
    // CLREX
    if insn == 0xf3bf_8f2f {
        return Outcome::Lifted;
    }
    // DSB, DMB, ISB
    if matches(insn, 0xffff_ffc0, 0xf3bf_8f40) && field(insn, 5, 4) != 0b11 {
        ctx.stmt(Stmt::Fence);
        return Outcome::Lifted;
    }
    // MRS Rd, APSR
    if matches(insn, 0xffff_f0ff, 0xf3ef_8000) {
        let rd = reg(insn, 8);
        if is_bad_reg(rd) {
            return Outcome::Undefined;
        }
        let apsr = read_apsr(ctx);
        let guard = ctx.guard;
        ctx.put_reg(rd, apsr, guard);
        return Outcome::Lifted;
    }
    // MSR APSR, Rn
    if matches(insn, 0xfff0_f0ff, 0xf380_8000) {
        let rn = reg(insn, 16);
        if is_bad_reg(rn) {
            return Outcome::Undefined;
        }
        let value = ctx.read_reg(rn);
        return write_apsr(ctx, field(insn, 11, 8), value);
    }
    Outcome::Undefined
}
