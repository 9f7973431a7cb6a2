//! Halfword, signed byte and doubleword loads and stores.

use armlift_ir::{Expr, LoadCvt};

use super::is_unconditional;
use crate::bits::{bit, field, reg};
use crate::context::DecodeContext;
use crate::families::memory::{Addressing, emit_dual, emit_load, emit_store};
use crate::families::{InstructionFamily, Outcome};
use crate::types::{REG_LR, REG_PC};

pub struct A32ExtraLoadStore;

impl InstructionFamily for A32ExtraLoadStore {
    fn name(&self) -> &'static str {
        "a32-extra-load-store"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        let op2 = field(insn, 6, 5);
        if is_unconditional(insn)
            || field(insn, 27, 25) != 0
            || !bit(insn, 7)
            || !bit(insn, 4)
            || op2 == 0
        {
            return Outcome::NotMatched;
        }
        let (p, u, imm, w, l) = (
            bit(insn, 24),
            bit(insn, 23),
            bit(insn, 22),
            bit(insn, 21),
            bit(insn, 20),
        );
        let (rn, rt) = (reg(insn, 16), reg(insn, 12));
        // LDRHT and friends
        if !p && w {
            return Outcome::Undefined;
        }
        let offset = if imm {
            Expr::u32((field(insn, 11, 8) << 4) | field(insn, 3, 0))
        } else {
            let rm = reg(insn, 0);
            if rm == REG_PC {
                return Outcome::Undefined;
            }
            ctx.read_reg(rm)
        };
        let am = Addressing::puw(rn, offset, p, u, w);
        if am.wback && rn == REG_PC {
            return Outcome::Undefined;
        }

        if !l && op2 != 0b01 {
            // LDRD / STRD
            let is_load = op2 == 0b10;
            if rt & 1 != 0 || rt == REG_LR {
                return Outcome::Undefined;
            }
            let rt2 = rt + 1;
            if am.wback && (rn == rt || rn == rt2) {
                return Outcome::Undefined;
            }
            emit_dual(ctx, is_load, rt, rt2, &am);
            return Outcome::Lifted;
        }

        if rt == REG_PC || (am.wback && rn == rt) {
            return Outcome::Undefined;
        }
        match (l, op2) {
            (false, _) => emit_store(ctx, LoadCvt::Zext16To32, rt, &am),
            (true, 0b01) => emit_load(ctx, LoadCvt::Zext16To32, rt, &am),
            (true, 0b10) => emit_load(ctx, LoadCvt::Sext8To32, rt, &am),
            (true, _) => emit_load(ctx, LoadCvt::Sext16To32, rt, &am),
        }
        Outcome::Lifted
    }
}
