//! Supervisor call.

use super::is_unconditional;
use crate::bits::field;
use crate::context::DecodeContext;
use crate::families::control::emit_svc;
use crate::families::{InstructionFamily, Outcome};

pub struct A32Svc;

impl InstructionFamily for A32Svc {
    fn name(&self) -> &'static str {
        "a32-svc"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if is_unconditional(insn) || field(insn, 27, 24) != 0b1111 {
            return Outcome::NotMatched;
        }
        emit_svc(ctx);
        Outcome::Lifted
    }
}
