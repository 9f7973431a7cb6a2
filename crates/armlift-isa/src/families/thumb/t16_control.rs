//! 16-bit Thumb control flow: BX/BLX, CBZ/CBNZ, IT, hints, conditional and
//! unconditional branches, SVC.

use armlift_ir::{Expr, JumpKind, Stmt};

use crate::bits::{bit, field, lo_reg, matches, reg, sign_extend};
use crate::context::DecodeContext;
use crate::families::control::{emit_direct_branch, emit_svc, emit_yield};
use crate::families::{InstructionFamily, Outcome};
use crate::flags;
use crate::guard;
use crate::it_state::ItState;
use crate::layout::OFFB_ITSTATE;
use crate::types::{Cond, REG_LR, REG_PC};

pub struct T16Control;

impl InstructionFamily for T16Control {
    fn name(&self) -> &'static str {
        "t16-control"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        let hw = insn & 0xffff;
        // BX, BLX (register): 0100 0111 L Rm 000
        if matches(hw, 0xff00, 0x4700) {
            return branch_exchange(ctx, hw);
        }
        // CBZ, CBNZ: 1011 o0i1 imm5 Rn
        if matches(hw, 0xf500, 0xb100) {
            guard::sigill_if_in_it_block(ctx);
            let rn = ctx.read_reg(lo_reg(hw, 0));
            let offset = field(hw, 9, 9) << 6 | field(hw, 7, 3) << 1;
            let dst = ctx.pc_operand().wrapping_add(offset) | 1;
            let taken = if bit(hw, 11) {
                Expr::cmp_ne32(rn, Expr::u32(0))
            } else {
                Expr::cmp_eq32(rn, Expr::u32(0))
            };
            ctx.stmt(Stmt::exit(taken, JumpKind::Boring, dst));
            return Outcome::Lifted;
        }
        // IT and hints: 1011 1111 firstcond mask
        if matches(hw, 0xff00, 0xbf00) {
            return if field(hw, 3, 0) == 0 {
                hint(ctx, field(hw, 7, 4))
            } else {
                if_then(ctx, hw)
            };
        }
        // BKPT
        if matches(hw, 0xff00, 0xbe00) {
            return Outcome::Undefined;
        }
        match hw >> 12 {
            0b1101 => match field(hw, 11, 8) {
                // UDF
                0b1110 => Outcome::Undefined,
                0b1111 => {
                    emit_svc(ctx);
                    Outcome::Lifted
                }
                cond => {
                    guard::sigill_if_in_it_block(ctx);
                    ctx.guard = flags::condition(ctx, Cond::from_bits(cond));
                    let offset = sign_extend(field(hw, 7, 0) << 1, 9);
                    let dst = ctx.pc_operand().wrapping_add(offset) | 1;
                    emit_direct_branch(ctx, dst, JumpKind::Boring);
                    Outcome::Lifted
                }
            },
            0b1110 if !bit(hw, 11) => {
                guard::sigill_if_in_but_not_last(ctx);
                let offset = sign_extend(field(hw, 10, 0) << 1, 12);
                let dst = ctx.pc_operand().wrapping_add(offset) | 1;
                emit_direct_branch(ctx, dst, JumpKind::Boring);
                Outcome::Lifted
            }
            _ => Outcome::NotMatched,
        }
    }
}

fn branch_exchange(ctx: &mut DecodeContext<'_>, hw: u32) -> Outcome {
    if field(hw, 2, 0) != 0 {
        return Outcome::Undefined;
    }
    let rm = reg(hw, 3);
    let link = bit(hw, 7);
    if link && (rm == REG_PC || !ctx.arch().has_v5te()) {
        return Outcome::Undefined;
    }
    guard::sigill_if_in_but_not_last(ctx);
    let target = ctx.read_reg(rm);
    let guard = ctx.guard;
    let jk = if link {
        let lr = ctx.next_pc_tagged();
        ctx.put_reg(REG_LR, Expr::u32(lr), guard);
        JumpKind::Call
    } else if rm == REG_LR {
        JumpKind::Ret
    } else {
        JumpKind::Boring
    };
    ctx.write_pc(target, guard, jk);
    Outcome::Lifted
}

/// `IT firstcond, mask`: the state for the following instructions replaces
/// the shifted ITSTATE written on entry.
fn if_then(ctx: &mut DecodeContext<'_>, hw: u32) -> Outcome {
    let Some(state) = ItState::from_it(field(hw, 7, 4), field(hw, 3, 0)) else {
        return Outcome::Undefined;
    };
    guard::sigill_if_in_it_block(ctx);
    ctx.irsb.put(OFFB_ITSTATE, Expr::u32(state.raw()));
    Outcome::Lifted
}

fn hint(ctx: &mut DecodeContext<'_>, op: u32) -> Outcome {
    // NOP, WFE, WFI, SEV and the unallocated hints do nothing
    if op == 0b0001 {
        emit_yield(ctx);
    }
    Outcome::Lifted
}
