//! Register access layer.
//!
//! Maps architectural registers onto guest state slots. Reads of R15 yield
//! the architecturally visible PC (instruction address + 8 in A32, + 4 in
//! Thumb); writes to R15 are recorded so the dispatcher can end the block.

use armlift_ir::{Expr, JumpKind, Temp};
use tracing::trace;

use crate::context::{DecodeContext, PcWrite};
use crate::guard::Guard;
use crate::layout::{OFFB_QFLAG32, OFFB_R15T, reg_offset};
use crate::types::REG_PC;

impl DecodeContext<'_> {
    /// Raw guest state read of register `r`, with no PC adjustment.
    pub fn ll_get_reg(r: u8) -> Expr {
        Expr::get32(reg_offset(r))
    }

    /// Operand value of register `r`.
    pub fn get_reg(&self, r: u8) -> Expr {
        if r == REG_PC {
            Expr::u32(self.pc_operand())
        } else {
            Self::ll_get_reg(r)
        }
    }

    /// Operand value of register `r`, bound to a temporary (or a constant
    /// for PC).
    pub fn read_reg(&mut self, r: u8) -> Expr {
        let e = self.get_reg(r);
        self.atom(e)
    }

    /// Operand value of register `r` in a fresh temporary.
    pub fn read_reg_tmp(&mut self, r: u8) -> Temp {
        let e = self.get_reg(r);
        self.bind(e)
    }

    /// Write `value` to slot `offset` when `guard` holds; otherwise keep the
    /// old contents.
    pub fn put_guarded(&mut self, offset: u32, value: Expr, guard: Guard) {
        let data = match guard {
            Guard::Always => value,
            Guard::When(t) => Expr::ite(Expr::tmp(t), value, Expr::get32(offset)),
        };
        self.irsb.put(offset, data);
    }

    /// Write a general register other than PC.
    ///
    /// # Panics
    ///
    /// Panics for `r == 15`; PC writes go through [`Self::write_pc`].
    pub fn put_reg(&mut self, r: u8, value: Expr, guard: Guard) {
        assert_ne!(r, REG_PC, "PC written through put_reg");
        self.put_guarded(reg_offset(r), value, guard);
    }

    /// Write PC, recording the jump kind the block should end with.
    ///
    /// The value is stored as-is, so bit 0 selects the instruction set of
    /// the target (interworking); callers that must stay in Thumb set it.
    pub fn write_pc(&mut self, value: Expr, guard: Guard, jk: JumpKind) {
        assert!(self.r15.is_none(), "PC written twice by one instruction");
        self.put_guarded(OFFB_R15T, value, guard);
        self.r15 = Some(PcWrite { guard, jk });
        trace!(pc = self.pc, ?jk, "r15 written");
    }

    /// PC write from a data-processing result: interworking from ARMv7 on,
    /// word-aligned before that.
    pub fn alu_write_pc(&mut self, value: Expr, guard: Guard, jk: JumpKind) {
        let value = if self.arch().arch_version >= 7 {
            value
        } else {
            Expr::and32(value, Expr::u32(!3))
        };
        self.write_pc(value, guard, jk);
    }

    /// Write any register; PC writes end the block with `jk`.
    pub fn put_reg_or_pc(&mut self, r: u8, value: Expr, guard: Guard, jk: JumpKind) {
        if r == REG_PC {
            self.write_pc(value, guard, jk);
        } else {
            self.put_reg(r, value, guard);
        }
    }

    /// OR a 0/1 saturation indication into the sticky Q flag.
    pub fn or_into_qflag(&mut self, sat: Expr, guard: Guard) {
        let q = Expr::or32(Expr::get32(OFFB_QFLAG32), sat);
        self.put_guarded(OFFB_QFLAG32, q, guard);
    }

    /// Check whether PC has been written by the current instruction.
    pub const fn pc_written(&self) -> bool {
        self.r15.is_some()
    }
}
