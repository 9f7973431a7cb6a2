//! Per-instruction decode context.
//!
//! A `DecodeContext` lives for exactly one `lift_one` call. It holds the
//! block being appended to by exclusive reference, so nothing else can
//! observe a half-lifted instruction.

use armlift_ir::{Expr, IrBlock, JumpKind, Stmt, Temp};

use crate::config::{ArchInfo, LiftOptions};
use crate::guard::{Guard, ItTrack};
use crate::types::InstrSet;

/// How the block continues after the current instruction, as decided by
/// the instruction itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Fall through, unless PC was written.
    Continue,
    /// Keep lifting at `target` within the same block.
    Resteer { target: u32, conditional: bool },
}

/// Recorded write to R15.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PcWrite {
    pub guard: Guard,
    pub jk: JumpKind,
}

/// State threaded through all components while lifting one instruction.
pub struct DecodeContext<'a> {
    pub(crate) irsb: &'a mut IrBlock,
    pub(crate) arch: &'a ArchInfo,
    pub(crate) opts: &'a LiftOptions,
    pub(crate) resteer_ok: &'a dyn Fn(u32) -> bool,
    pub(crate) iset: InstrSet,
    /// Address of the current instruction, Thumb bit clear.
    pub(crate) pc: u32,
    /// Length of the current instruction in bytes.
    pub(crate) len: u32,
    /// Guard for register and memory effects.
    pub(crate) guard: Guard,
    /// Guard for flag updates by 16-bit Thumb forms; `None` means never.
    pub(crate) flag_guard: Option<Guard>,
    pub(crate) it: ItTrack,
    pub(crate) r15: Option<PcWrite>,
    pub(crate) flow: Flow,
}

impl<'a> DecodeContext<'a> {
    pub(crate) fn new(
        irsb: &'a mut IrBlock,
        arch: &'a ArchInfo,
        opts: &'a LiftOptions,
        resteer_ok: &'a dyn Fn(u32) -> bool,
        pc: u32,
        len: u32,
    ) -> Self {
        Self {
            irsb,
            arch,
            opts,
            resteer_ok,
            iset: InstrSet::from_pc(pc),
            pc: pc & !1,
            len,
            guard: Guard::Always,
            flag_guard: Some(Guard::Always),
            it: ItTrack::None,
            r15: None,
            flow: Flow::Continue,
        }
    }

    /// Address of the current instruction (Thumb bit clear).
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    pub const fn arch(&self) -> &ArchInfo {
        self.arch
    }

    /// Guard of the current instruction.
    pub const fn guard(&self) -> Guard {
        self.guard
    }

    /// Address of the following instruction, Thumb bit clear.
    pub const fn next_pc(&self) -> u32 {
        self.pc.wrapping_add(self.len)
    }

    /// Address of the following instruction with the Thumb bit applied.
    pub const fn next_pc_tagged(&self) -> u32 {
        self.next_pc() | self.iset.pc_tag()
    }

    /// Value of PC when read as an operand.
    pub const fn pc_operand(&self) -> u32 {
        self.pc.wrapping_add(self.iset.pc_read_offset())
    }

    /// Append a statement.
    pub fn stmt(&mut self, s: Stmt) {
        self.irsb.push(s);
    }

    /// Bind an expression to a fresh temporary.
    pub fn bind(&mut self, e: Expr) -> Temp {
        self.irsb.bind(e)
    }

    /// Bind unless `e` is already a constant or temporary.
    pub fn atom(&mut self, e: Expr) -> Expr {
        match e {
            Expr::Const(_) | Expr::RdTmp(_) => e,
            other => Expr::tmp(self.bind(other)),
        }
    }

    /// Combine a guard with an extra `I1` condition.
    pub fn guard_and(&mut self, guard: Guard, cond: Expr) -> Guard {
        match guard {
            Guard::Always => Guard::When(self.bind(cond)),
            Guard::When(t) => Guard::When(self.bind(Expr::and1(Expr::tmp(t), cond))),
        }
    }
}
