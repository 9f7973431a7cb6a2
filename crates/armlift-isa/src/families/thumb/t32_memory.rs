//! 32-bit Thumb loads and stores: LDM/STM, LDRD/STRD and the single
//! register forms (imm12, imm8 with P/U/W, register offset, literal),
//! with preloads as no-ops.

use armlift_ir::{Expr, LoadCvt};

use super::is_bad_reg;
use crate::bits::{bit, field, matches, reg};
use crate::context::DecodeContext;
use crate::families::memory::{Addressing, Multiple, emit_dual, emit_load, emit_multiple, emit_store};
use crate::families::{InstructionFamily, Outcome};
use crate::guard;
use crate::types::{REG_LR, REG_PC, REG_SP};

pub struct T32Memory;

impl InstructionFamily for T32Memory {
    fn name(&self) -> &'static str {
        "t32-memory"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if matches(insn, 0xfe40_0000, 0xe800_0000) {
            multiple(ctx, insn)
        } else if matches(insn, 0xfe40_0000, 0xe840_0000) {
            dual(ctx, insn)
        } else if matches(insn, 0xfe00_0000, 0xf800_0000) {
            single(ctx, insn)
        } else {
            Outcome::NotMatched
        }
    }
}

/// `1110100 op 0 W L Rn | P M 0 list`
fn multiple(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let increment = match field(insn, 24, 23) {
        0b01 => true,
        0b10 => false,
        // SRS, RFE
        _ => return Outcome::Undefined,
    };
    let (rn, wback, load_op) = (reg(insn, 16), bit(insn, 21), bit(insn, 20));
    let regs = field(insn, 15, 0) as u16;
    let has = |r: u8| regs & (1 << r) != 0;
    let bad_list = regs.count_ones() < 2
        || has(REG_SP)
        || if load_op {
            has(REG_PC) && has(REG_LR)
        } else {
            has(REG_PC) || has(REG_LR)
        };
    if rn == REG_PC || bad_list || (wback && has(rn)) {
        return Outcome::Undefined;
    }
    if load_op && has(REG_PC) {
        guard::sigill_if_in_but_not_last(ctx);
    }
    let m = Multiple {
        rn,
        regs,
        increment,
        before: !increment,
        wback,
    };
    emit_multiple(ctx, load_op, m);
    Outcome::Lifted
}

/// `1110100 P U 1 W L Rn | Rt Rt2 imm8`
fn dual(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let (p, u, w, load_op) = (bit(insn, 24), bit(insn, 23), bit(insn, 21), bit(insn, 20));
    if !p && !w {
        // exclusives and table branches
        return Outcome::NotMatched;
    }
    let (rn, rt, rt2) = (reg(insn, 16), reg(insn, 12), reg(insn, 8));
    let bad = is_bad_reg(rt)
        || is_bad_reg(rt2)
        || (w && (rn == rt || rn == rt2 || rn == REG_PC))
        || (load_op && rt == rt2)
        || (!load_op && rn == REG_PC);
    if bad {
        return Outcome::Undefined;
    }
    let am = Addressing::puw(rn, Expr::u32(field(insn, 7, 0) << 2), p, u, w);
    emit_dual(ctx, load_op, rt, rt2, &am);
    Outcome::Lifted
}

/// `1111100 S U size L Rn | Rt ...`
fn single(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    let (signed, load_op) = (bit(insn, 24), bit(insn, 20));
    let (rn, rt) = (reg(insn, 16), reg(insn, 12));
    let size = field(insn, 22, 21);
    let cvt = match (size, signed) {
        (0b00, false) => LoadCvt::Zext8To32,
        (0b00, true) => LoadCvt::Sext8To32,
        (0b01, false) => LoadCvt::Zext16To32,
        (0b01, true) => LoadCvt::Sext16To32,
        (0b10, false) => LoadCvt::Ident32,
        _ => return Outcome::Undefined,
    };
    if !load_op && (signed || rn == REG_PC) {
        return Outcome::Undefined;
    }
    let Some(am) = addressing(ctx, insn, rn) else {
        return Outcome::Undefined;
    };
    let word = size == 0b10;
    if load_op && rt == REG_PC && !word {
        // PLD, PLDW, PLI
        return Outcome::Lifted;
    }
    if am.wback && rn == rt {
        return Outcome::Undefined;
    }
    if load_op {
        if rt == REG_SP && !word {
            return Outcome::Undefined;
        }
        if rt == REG_PC {
            guard::sigill_if_in_but_not_last(ctx);
        }
        emit_load(ctx, cvt, rt, &am);
    } else {
        if rt == REG_PC || (rt == REG_SP && !word) {
            return Outcome::Undefined;
        }
        emit_store(ctx, cvt, rt, &am);
    }
    Outcome::Lifted
}

/// Decode the addressing form; `None` for unallocated and unprivileged
/// (`LDRT`-style) forms.
fn addressing(ctx: &mut DecodeContext<'_>, insn: u32, rn: u8) -> Option<Addressing> {
    if rn == REG_PC {
        // literal
        let imm = Expr::u32(field(insn, 11, 0));
        return Some(Addressing::offset(REG_PC, imm, bit(insn, 23)));
    }
    if bit(insn, 23) {
        let imm = Expr::u32(field(insn, 11, 0));
        return Some(Addressing::offset(rn, imm, true));
    }
    if bit(insn, 11) {
        let puw = field(insn, 10, 8);
        if puw == 0b110 || puw & 0b101 == 0 {
            return None;
        }
        let imm = Expr::u32(field(insn, 7, 0));
        return Some(Addressing::puw(rn, imm, bit(insn, 10), bit(insn, 9), bit(insn, 8)));
    }
    if field(insn, 11, 6) == 0 {
        let rm = reg(insn, 0);
        if is_bad_reg(rm) {
            return None;
        }
        let amount = field(insn, 5, 4) as u8;
        let index = ctx.read_reg(rm);
        let offset = ctx.atom(Expr::shl32(index, amount));
        return Some(Addressing::offset(rn, offset, true));
    }
    None
}
