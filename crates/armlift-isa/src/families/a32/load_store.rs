//! Word and unsigned byte loads and stores.

use armlift_ir::{Expr, LoadCvt};

use super::is_unconditional;
use crate::bits::{bit, field, reg};
use crate::context::DecodeContext;
use crate::families::memory::{Addressing, emit_load, emit_store};
use crate::families::{InstructionFamily, Outcome};
use crate::shifter::{ShifterOperand, eval_operand};
use crate::types::{REG_PC, ShiftKind};

pub struct A32LoadStore;

impl InstructionFamily for A32LoadStore {
    fn name(&self) -> &'static str {
        "a32-load-store"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        let reg_form = bit(insn, 25);
        // bit 25 and bit 4 together are the media space
        if is_unconditional(insn) || field(insn, 27, 26) != 0b01 || (reg_form && bit(insn, 4)) {
            return Outcome::NotMatched;
        }
        let (p, u, b, w, l) = (
            bit(insn, 24),
            bit(insn, 23),
            bit(insn, 22),
            bit(insn, 21),
            bit(insn, 20),
        );
        let (rn, rt) = (reg(insn, 16), reg(insn, 12));
        // LDRT, STRT, LDRBT, STRBT
        if !p && w {
            return Outcome::Undefined;
        }
        let offset = if reg_form {
            let rm = reg(insn, 0);
            if rm == REG_PC || ((!p || w) && rm == rn) {
                return Outcome::Undefined;
            }
            let shifter = ShifterOperand::ImmShift {
                rm,
                kind: ShiftKind::from_bits(field(insn, 6, 5)),
                imm5: field(insn, 11, 7) as u8,
            };
            eval_operand(ctx, shifter, false).value
        } else {
            Expr::u32(field(insn, 11, 0))
        };
        let am = Addressing::puw(rn, offset, p, u, w);
        if am.wback && (rn == REG_PC || rn == rt) {
            return Outcome::Undefined;
        }
        if b && rt == REG_PC {
            return Outcome::Undefined;
        }
        let cvt = if b {
            LoadCvt::Zext8To32
        } else {
            LoadCvt::Ident32
        };
        if l {
            emit_load(ctx, cvt, rt, &am);
        } else {
            emit_store(ctx, cvt, rt, &am);
        }
        Outcome::Lifted
    }
}
