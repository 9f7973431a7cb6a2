//! LDM and STM in all four addressing modes.

use super::is_unconditional;
use crate::bits::{bit, field, reg};
use crate::context::DecodeContext;
use crate::families::memory::{Multiple, emit_multiple};
use crate::families::{InstructionFamily, Outcome};
use crate::types::REG_PC;

pub struct A32LoadStoreMultiple;

impl InstructionFamily for A32LoadStoreMultiple {
    fn name(&self) -> &'static str {
        "a32-load-store-multiple"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if is_unconditional(insn) || field(insn, 27, 25) != 0b100 {
            return Outcome::NotMatched;
        }
        let m = Multiple {
            rn: reg(insn, 16),
            regs: field(insn, 15, 0) as u16,
            increment: bit(insn, 23),
            before: bit(insn, 24),
            wback: bit(insn, 21),
        };
        let load = bit(insn, 20);
        // user-bank and exception-return forms
        if bit(insn, 22) || m.regs == 0 || m.rn == REG_PC {
            return Outcome::Undefined;
        }
        if load && m.wback && m.regs & (1 << m.rn) != 0 {
            return Outcome::Undefined;
        }
        emit_multiple(ctx, load, m);
        Outcome::Lifted
    }
}
