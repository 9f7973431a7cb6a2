//! Load and store semantics shared by the A32 and Thumb encodings.
//!
//! Loads and stores honour the instruction guard with `LoadG`/`StoreG`, so a
//! predicated access never touches memory when its condition fails.

use armlift_ir::{Expr, IrType, JumpKind, LoadCvt, Stmt, UnOp};

use crate::context::DecodeContext;
use crate::guard::{self, Guard};
use crate::types::{REG_PC, REG_SP};

/// Value of a base register; PC reads as the word-aligned operand value.
pub(crate) fn base_value(ctx: &mut DecodeContext<'_>, rn: u8) -> Expr {
    if rn == REG_PC {
        Expr::u32(ctx.pc_operand() & !3)
    } else {
        ctx.read_reg(rn)
    }
}

/// Load through the current guard; `alt` is the result when the guard is
/// false. Returns an `I32` atom.
pub(crate) fn load(ctx: &mut DecodeContext<'_>, cvt: LoadCvt, addr: Expr, alt: Expr) -> Expr {
    match ctx.guard {
        Guard::Always => {
            let raw = Expr::load(cvt.mem_type(), addr);
            let widened = match cvt {
                LoadCvt::Ident32 => raw,
                LoadCvt::Zext8To32 => Expr::unop(UnOp::Zext8To32, raw),
                LoadCvt::Sext8To32 => Expr::unop(UnOp::Sext8To32, raw),
                LoadCvt::Zext16To32 => Expr::unop(UnOp::Zext16To32, raw),
                LoadCvt::Sext16To32 => Expr::unop(UnOp::Sext16To32, raw),
            };
            Expr::tmp(ctx.bind(widened))
        }
        Guard::When(g) => {
            let dst = ctx.irsb.new_temp(IrType::I32);
            ctx.stmt(Stmt::LoadG {
                dst,
                cvt,
                addr,
                alt,
                guard: Expr::tmp(g),
            });
            Expr::tmp(dst)
        }
    }
}

/// Store the low `cvt.mem_type()` bits of `data` through the current guard.
pub(crate) fn store(ctx: &mut DecodeContext<'_>, cvt: LoadCvt, addr: Expr, data: Expr) {
    let data = match cvt.mem_type() {
        IrType::I8 => Expr::to8(data),
        IrType::I16 => Expr::to16(data),
        _ => data,
    };
    let s = match ctx.guard {
        Guard::Always => Stmt::store(addr, data),
        Guard::When(g) => Stmt::StoreG {
            addr,
            data,
            guard: Expr::tmp(g),
        },
    };
    ctx.stmt(s);
}

/// Addressing mode of a single-register access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Addressing {
    pub rn: u8,
    /// Offset atom, added or subtracted per `add`.
    pub offset: Expr,
    pub add: bool,
    /// Pre-indexed (P); post-indexed accesses use the unmodified base.
    pub index: bool,
    pub wback: bool,
}

impl Addressing {
    pub(crate) const fn offset(rn: u8, offset: Expr, add: bool) -> Self {
        Self {
            rn,
            offset,
            add,
            index: true,
            wback: false,
        }
    }

    /// Decode the P/U/W bits found at 24/23/21 in A32 and at 10/9/8 of the
    /// T32 imm8 forms.
    pub(crate) const fn puw(rn: u8, offset: Expr, p: bool, u: bool, w: bool) -> Self {
        Self {
            rn,
            offset,
            add: u,
            index: p,
            wback: !p || w,
        }
    }

    /// Post-indexed pop through SP, the usual function return idiom.
    const fn is_pop(&self) -> bool {
        self.rn == REG_SP && self.wback && !self.index && self.add
    }
}

/// Access address and writeback value, both atoms.
fn resolve(ctx: &mut DecodeContext<'_>, am: &Addressing) -> (Expr, Option<Expr>) {
    let base = base_value(ctx, am.rn);
    let offset_addr = if am.add {
        Expr::add32(base.clone(), am.offset.clone())
    } else {
        Expr::sub32(base.clone(), am.offset.clone())
    };
    let offset_addr = ctx.atom(offset_addr);
    let addr = if am.index { offset_addr.clone() } else { base };
    (addr, am.wback.then_some(offset_addr))
}

/// Single-register load (`LDR`, `LDRB`, `LDRH`, `LDRSB`, `LDRSH`).
///
/// Loading PC interworks on bit 0 and ends the block; a post-indexed pop
/// through SP is a return.
pub(crate) fn emit_load(ctx: &mut DecodeContext<'_>, cvt: LoadCvt, rt: u8, am: &Addressing) {
    let (addr, writeback) = resolve(ctx, am);
    let alt = ctx.get_reg(rt);
    let value = load(ctx, cvt, addr, alt);
    let guard = ctx.guard;
    if let Some(wb) = writeback {
        ctx.put_reg(am.rn, wb, guard);
    }
    let jk = if am.is_pop() {
        JumpKind::Ret
    } else {
        JumpKind::Boring
    };
    ctx.put_reg_or_pc(rt, value, guard, jk);
}

/// Single-register store (`STR`, `STRB`, `STRH`).
pub(crate) fn emit_store(ctx: &mut DecodeContext<'_>, cvt: LoadCvt, rt: u8, am: &Addressing) {
    let (addr, writeback) = resolve(ctx, am);
    let data = ctx.read_reg(rt);
    store(ctx, cvt, addr, data);
    if let Some(wb) = writeback {
        let guard = ctx.guard;
        ctx.put_reg(am.rn, wb, guard);
    }
}

/// `LDRD` / `STRD`.
pub(crate) fn emit_dual(ctx: &mut DecodeContext<'_>, load_op: bool, rt: u8, rt2: u8, am: &Addressing) {
    let (addr, writeback) = resolve(ctx, am);
    let addr2 = ctx.atom(Expr::add32(addr.clone(), Expr::u32(4)));
    let guard = ctx.guard;
    if load_op {
        let (alt1, alt2) = (ctx.get_reg(rt), ctx.get_reg(rt2));
        let v1 = load(ctx, LoadCvt::Ident32, addr, alt1);
        let v2 = load(ctx, LoadCvt::Ident32, addr2, alt2);
        if let Some(wb) = writeback {
            ctx.put_reg(am.rn, wb, guard);
        }
        ctx.put_reg(rt, v1, guard);
        ctx.put_reg(rt2, v2, guard);
    } else {
        let d1 = ctx.read_reg(rt);
        let d2 = ctx.read_reg(rt2);
        store(ctx, LoadCvt::Ident32, addr, d1);
        store(ctx, LoadCvt::Ident32, addr2, d2);
        if let Some(wb) = writeback {
            ctx.put_reg(am.rn, wb, guard);
        }
    }
}

/// Block transfer direction and base adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Multiple {
    pub rn: u8,
    pub regs: u16,
    pub increment: bool,
    pub before: bool,
    pub wback: bool,
}

impl Multiple {
    fn count(&self) -> u32 {
        self.regs.count_ones()
    }

    fn contains(&self, r: u8) -> bool {
        self.regs & (1 << r) != 0
    }

    /// Offset of the lowest address from the base.
    fn start_offset(&self) -> u32 {
        let span = 4 * self.count();
        match (self.increment, self.before) {
            (true, false) => 0,
            (true, true) => 4,
            (false, false) => 4u32.wrapping_sub(span),
            (false, true) => 0u32.wrapping_sub(span),
        }
    }

    fn registers(&self) -> impl Iterator<Item = u8> + '_ {
        (0..16u8).filter(|r| self.contains(*r))
    }
}

/// `LDM`/`STM` family (including `PUSH`/`POP`).
///
/// A false guard skips the whole instruction with a side exit first, so the
/// transfer itself is unconditional. Loads complete before any register is
/// written; PC is written last.
pub(crate) fn emit_multiple(ctx: &mut DecodeContext<'_>, load_op: bool, m: Multiple) {
    guard::skip_if_false(ctx);
    let base = Expr::tmp(ctx.read_reg_tmp(m.rn));
    let span = 4 * m.count();
    let new_base = if m.increment {
        Expr::add32(base.clone(), Expr::u32(span))
    } else {
        Expr::sub32(base.clone(), Expr::u32(span))
    };
    let start = m.start_offset();
    let addr_of = |i: u32| Expr::add32(base.clone(), Expr::u32(start.wrapping_add(4 * i)));

    if load_op {
        let loaded: Vec<(u8, Expr)> = m
            .registers()
            .zip(0..)
            .map(|(r, i)| (r, Expr::tmp(ctx.bind(Expr::load(IrType::I32, addr_of(i))))))
            .collect();
        if m.wback && !m.contains(m.rn) {
            ctx.put_reg(m.rn, new_base, Guard::Always);
        }
        let mut pc_value = None;
        for (r, v) in loaded {
            if r == REG_PC {
                pc_value = Some(v);
            } else {
                ctx.put_reg(r, v, Guard::Always);
            }
        }
        if let Some(v) = pc_value {
            let pop = m.rn == REG_SP && m.wback && m.increment && !m.before;
            let jk = if pop { JumpKind::Ret } else { JumpKind::Boring };
            ctx.write_pc(v, Guard::Always, jk);
        }
    } else {
        let values: Vec<Expr> = m.registers().map(|r| ctx.read_reg(r)).collect();
        for (i, v) in (0..).zip(values) {
            let addr = addr_of(i);
            ctx.stmt(Stmt::store(addr, v));
        }
        if m.wback {
            ctx.put_reg(m.rn, new_base, Guard::Always);
        }
    }
}
