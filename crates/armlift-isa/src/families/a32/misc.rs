//! Miscellaneous instructions in the data-processing space: BX, BLX
//! (register), CLZ, MRS, MSR and the saturating add/subtract group.

use armlift_ir::{Expr, JumpKind};

use super::is_unconditional;
use crate::bits::{bit, field, matches, reg};
use crate::context::DecodeContext;
use crate::families::alu::{emit_clz, emit_qaddsub, read_apsr, write_apsr};
use crate::families::{InstructionFamily, Outcome};
use crate::shifter::arm_expand_imm;
use crate::types::{REG_LR, REG_PC};

pub struct A32Misc;

impl InstructionFamily for A32Misc {
    fn name(&self) -> &'static str {
        "a32-misc"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if is_unconditional(insn) {
            return Outcome::NotMatched;
        }
        // MSR (immediate): 0011 0R10 mask 1111 imm12
        if matches(insn, 0x0fb0_f000, 0x0320_f000) && field(insn, 19, 16) != 0 {
            if bit(insn, 22) {
                return Outcome::Undefined;
            }
            let value = Expr::u32(arm_expand_imm(field(insn, 11, 0)));
            return write_apsr(ctx, field(insn, 19, 16), value);
        }
        // 0001 0xx0 with bit 7 clear
        if field(insn, 27, 23) != 0b00010 || bit(insn, 20) || bit(insn, 7) {
            return Outcome::NotMatched;
        }
        let op = field(insn, 22, 21);
        match (field(insn, 6, 4), op) {
            // MRS
            (0b000, 0b00 | 0b10) => {
                let rd = reg(insn, 12);
                if op == 0b10 || rd == REG_PC {
                    return Outcome::Undefined;
                }
                let apsr = read_apsr(ctx);
                let guard = ctx.guard;
                ctx.put_reg(rd, apsr, guard);
                Outcome::Lifted
            }
            // MSR (register)
            (0b000, 0b01 | 0b11) => {
                let rn = reg(insn, 0);
                if op == 0b11 || rn == REG_PC {
                    return Outcome::Undefined;
                }
                let value = ctx.read_reg(rn);
                write_apsr(ctx, field(insn, 19, 16), value)
            }
            // BX
            (0b001, 0b01) => {
                let rm = reg(insn, 0);
                let target = ctx.read_reg(rm);
                let jk = if rm == REG_LR {
                    JumpKind::Ret
                } else {
                    JumpKind::Boring
                };
                let guard = ctx.guard;
                ctx.write_pc(target, guard, jk);
                Outcome::Lifted
            }
            // CLZ
            (0b001, 0b11) => {
                let (rd, rm) = (reg(insn, 12), reg(insn, 0));
                if !ctx.arch().has_v5te() || rd == REG_PC || rm == REG_PC {
                    return Outcome::Undefined;
                }
                emit_clz(ctx, rd, rm);
                Outcome::Lifted
            }
            // BLX (register)
            (0b011, 0b01) => {
                let rm = reg(insn, 0);
                if !ctx.arch().has_v5te() || rm == REG_PC {
                    return Outcome::Undefined;
                }
                // read the target before LR is overwritten
                let target = ctx.read_reg(rm);
                let guard = ctx.guard;
                let lr = ctx.next_pc();
                ctx.put_reg(REG_LR, Expr::u32(lr), guard);
                ctx.write_pc(target, guard, JumpKind::Call);
                Outcome::Lifted
            }
            // QADD, QSUB, QDADD, QDSUB
            (0b101, _) => {
                let (rn, rd, rm) = (reg(insn, 16), reg(insn, 12), reg(insn, 0));
                if !ctx.arch().has_v5te() || [rn, rd, rm].contains(&REG_PC) {
                    return Outcome::Undefined;
                }
                emit_qaddsub(ctx, rd, rm, rn, op & 0b10 != 0, op & 0b01 != 0);
                Outcome::Lifted
            }
            _ => Outcome::NotMatched,
        }
    }
}
