//! Data-processing, multiply and status register semantics shared by the
//! A32 and Thumb encodings.

use armlift_ir::{BinOp, Expr, JumpKind, UnOp};

use crate::context::DecodeContext;
use crate::families::Outcome;
use crate::flags::{self, CcOp};
use crate::guard::Guard;
use crate::layout::{OFFB_QFLAG32, ge_offset};
use crate::shifter::Shifted;
use crate::types::REG_PC;

/// Data-processing operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DpOp {
    And,
    Eor,
    Sub,
    Rsb,
    Add,
    Adc,
    Sbc,
    Rsc,
    Tst,
    Teq,
    Cmp,
    Cmn,
    Orr,
    Mov,
    Bic,
    Mvn,
    Orn,
}

impl DpOp {
    /// A32 opcode field (bits 24:21).
    pub(crate) const fn from_a32(opc: u32) -> Self {
        match opc & 0xf {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Sub,
            0x3 => Self::Rsb,
            0x4 => Self::Add,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Rsc,
            0x8 => Self::Tst,
            0x9 => Self::Teq,
            0xa => Self::Cmp,
            0xb => Self::Cmn,
            0xc => Self::Orr,
            0xd => Self::Mov,
            0xe => Self::Bic,
            _ => Self::Mvn,
        }
    }

    /// T32 opcode field (bits 24:21 of the combined word), before the
    /// `Rd == PC` / `Rn == PC` aliases are applied.
    pub(crate) const fn from_t32(op: u32) -> Option<Self> {
        Some(match op & 0xf {
            0x0 => Self::And,
            0x1 => Self::Bic,
            0x2 => Self::Orr,
            0x3 => Self::Orn,
            0x4 => Self::Eor,
            0x8 => Self::Add,
            0xa => Self::Adc,
            0xb => Self::Sbc,
            0xd => Self::Sub,
            0xe => Self::Rsb,
            _ => return None,
        })
    }

    /// Only sets flags; no destination register.
    pub(crate) const fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// Flags come from the result and the shifter carry.
    pub(crate) const fn is_logical(self) -> bool {
        matches!(
            self,
            Self::And
                | Self::Eor
                | Self::Tst
                | Self::Teq
                | Self::Orr
                | Self::Mov
                | Self::Bic
                | Self::Mvn
                | Self::Orn
        )
    }

    /// Reads the first operand register.
    pub(crate) const fn uses_rn(self) -> bool {
        !matches!(self, Self::Mov | Self::Mvn)
    }

    /// The test form a flag-setting op turns into when `Rd` is discarded.
    pub(crate) const fn as_test(self) -> Option<Self> {
        match self {
            Self::And => Some(Self::Tst),
            Self::Eor => Some(Self::Teq),
            Self::Add => Some(Self::Cmn),
            Self::Sub => Some(Self::Cmp),
            _ => None,
        }
    }

    const fn needs_carry_in(self) -> bool {
        matches!(self, Self::Adc | Self::Sbc | Self::Rsc)
    }
}

/// Emit one data-processing operation.
///
/// `rn` is an atom (ignored by MOV/MVN). A `None` shifter carry on a
/// flag-setting logical op leaves C unchanged. `flag_guard` is the guard for the
/// thunk update, or `None` for no update. A write to `rd == 15` ends the
/// block with `pc_jk`.
pub(crate) fn emit_dp(
    ctx: &mut DecodeContext<'_>,
    op: DpOp,
    rd: u8,
    rn: Expr,
    operand: Shifted,
    flag_guard: Option<Guard>,
    pc_jk: JumpKind,
) {
    let Shifted { value: op2, carry } = operand;
    let old_c = if op.needs_carry_in() {
        flags::old_c(ctx)
    } else {
        Expr::u32(0)
    };
    let borrow = || Expr::xor32(old_c.clone(), Expr::u32(1));
    let result = match op {
        DpOp::And | DpOp::Tst => Expr::and32(rn.clone(), op2.clone()),
        DpOp::Eor | DpOp::Teq => Expr::xor32(rn.clone(), op2.clone()),
        DpOp::Orr => Expr::or32(rn.clone(), op2.clone()),
        DpOp::Orn => Expr::or32(rn.clone(), Expr::not32(op2.clone())),
        DpOp::Bic => Expr::and32(rn.clone(), Expr::not32(op2.clone())),
        DpOp::Mov => op2.clone(),
        DpOp::Mvn => Expr::not32(op2.clone()),
        DpOp::Add | DpOp::Cmn => Expr::add32(rn.clone(), op2.clone()),
        DpOp::Sub | DpOp::Cmp => Expr::sub32(rn.clone(), op2.clone()),
        DpOp::Rsb => Expr::sub32(op2.clone(), rn.clone()),
        DpOp::Adc => Expr::add32(Expr::add32(rn.clone(), op2.clone()), old_c.clone()),
        DpOp::Sbc => Expr::sub32(Expr::sub32(rn.clone(), op2.clone()), borrow()),
        DpOp::Rsc => Expr::sub32(Expr::sub32(op2.clone(), rn.clone()), borrow()),
    };
    let result = ctx.atom(result);
    if !op.is_test() {
        let guard = ctx.guard;
        if rd == REG_PC {
            ctx.alu_write_pc(result.clone(), guard, pc_jk);
        } else {
            ctx.put_reg(rd, result.clone(), guard);
        }
    }
    let Some(fg) = flag_guard else {
        return;
    };
    match op {
        DpOp::Add | DpOp::Cmn => flags::set_flags_d1_d2(ctx, CcOp::Add, rn, op2, fg),
        DpOp::Sub | DpOp::Cmp => flags::set_flags_d1_d2(ctx, CcOp::Sub, rn, op2, fg),
        DpOp::Rsb => flags::set_flags_d1_d2(ctx, CcOp::Sub, op2, rn, fg),
        DpOp::Adc => flags::set_flags(ctx, CcOp::Adc, rn, op2, old_c, fg),
        DpOp::Sbc => flags::set_flags(ctx, CcOp::Sbb, rn, op2, old_c, fg),
        DpOp::Rsc => flags::set_flags(ctx, CcOp::Sbb, op2, rn, old_c, fg),
        _ => {
            let carry = match carry {
                Some(c) => c,
                None => flags::old_c(ctx),
            };
            flags::set_flags_logic(ctx, result, carry, fg);
        }
    }
}

/// Accumulator of a 32-bit multiply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MulAcc {
    None,
    /// `Rd = Ra + Rn * Rm`
    Add(u8),
    /// `Rd = Ra - Rn * Rm`
    Sub(u8),
}

/// `MUL`, `MLA` and `MLS`.
pub(crate) fn emit_mul(
    ctx: &mut DecodeContext<'_>,
    rd: u8,
    rn: u8,
    rm: u8,
    acc: MulAcc,
    flag_guard: Option<Guard>,
) {
    let a = ctx.read_reg(rn);
    let b = ctx.read_reg(rm);
    let product = Expr::mul32(a, b);
    let result = match acc {
        MulAcc::None => product,
        MulAcc::Add(ra) => {
            let acc = ctx.read_reg(ra);
            Expr::add32(product, acc)
        }
        MulAcc::Sub(ra) => {
            let acc = ctx.read_reg(ra);
            Expr::sub32(acc, product)
        }
    };
    let result = ctx.atom(result);
    let guard = ctx.guard;
    ctx.put_reg(rd, result.clone(), guard);
    if let Some(fg) = flag_guard {
        let cv = flags::old_c_v(ctx);
        flags::set_flags_d1_nd(ctx, CcOp::Mul, result, cv, fg);
    }
}

/// 64-bit multiply variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LongMul {
    Umull,
    Umlal,
    Smull,
    Smlal,
    /// `RdHi:RdLo = Rn * Rm + RdHi + RdLo`, unsigned.
    Umaal,
}

impl LongMul {
    /// A32 `op` field (bits 23:21) of the long multiplies.
    pub(crate) const fn from_a32(op: u32) -> Option<Self> {
        Some(match op & 7 {
            0b010 => Self::Umaal,
            0b100 => Self::Umull,
            0b101 => Self::Umlal,
            0b110 => Self::Smull,
            0b111 => Self::Smlal,
            _ => return None,
        })
    }

    const fn signed(self) -> bool {
        matches!(self, Self::Smull | Self::Smlal)
    }
}

/// Long multiplies; `rdlo != rdhi` is the caller's check.
pub(crate) fn emit_mul_long(
    ctx: &mut DecodeContext<'_>,
    kind: LongMul,
    rdlo: u8,
    rdhi: u8,
    rn: u8,
    rm: u8,
    flag_guard: Option<Guard>,
) {
    let a = ctx.read_reg(rn);
    let b = ctx.read_reg(rm);
    let op = if kind.signed() {
        BinOp::MullS32
    } else {
        BinOp::MullU32
    };
    let product = Expr::binop(op, a, b);
    let wide = match kind {
        LongMul::Umull | LongMul::Smull => product,
        LongMul::Umlal | LongMul::Smlal => {
            let acc = Expr::hl64(ctx.get_reg(rdhi), ctx.get_reg(rdlo));
            Expr::binop(BinOp::Add64, product, acc)
        }
        LongMul::Umaal => {
            let hi = Expr::unop(UnOp::Zext32To64, ctx.get_reg(rdhi));
            let lo = Expr::unop(UnOp::Zext32To64, ctx.get_reg(rdlo));
            Expr::binop(BinOp::Add64, Expr::binop(BinOp::Add64, product, hi), lo)
        }
    };
    let wide = Expr::tmp(ctx.bind(wide));
    let lo = ctx.atom(Expr::lo32(wide.clone()));
    let hi = ctx.atom(Expr::hi32(wide));
    let guard = ctx.guard;
    ctx.put_reg(rdlo, lo.clone(), guard);
    ctx.put_reg(rdhi, hi.clone(), guard);
    if let Some(fg) = flag_guard {
        let cv = flags::old_c_v(ctx);
        flags::set_flags(ctx, CcOp::Mull, lo, hi, cv, fg);
    }
}

/// `QADD`, `QSUB`, `QDADD` and `QDSUB`: `Rd = Rm +/- sat(Rn or 2*Rn)`, with
/// the sticky Q flag set on any saturation.
pub(crate) fn emit_qaddsub(
    ctx: &mut DecodeContext<'_>,
    rd: u8,
    rm: u8,
    rn: u8,
    double: bool,
    sub: bool,
) {
    let guard = ctx.guard;
    let m = ctx.read_reg(rm);
    let mut n = ctx.read_reg(rn);
    if double {
        let doubled = ctx.atom(Expr::binop(BinOp::QAdd32S, n.clone(), n.clone()));
        let sat = Expr::cmp_ne32(doubled.clone(), Expr::add32(n.clone(), n));
        ctx.or_into_qflag(Expr::from1(sat), guard);
        n = doubled;
    }
    let (op, wrap) = if sub {
        (BinOp::QSub32S, Expr::sub32(m.clone(), n.clone()))
    } else {
        (BinOp::QAdd32S, Expr::add32(m.clone(), n.clone()))
    };
    let result = ctx.atom(Expr::binop(op, m, n));
    ctx.or_into_qflag(Expr::from1(Expr::cmp_ne32(result.clone(), wrap)), guard);
    ctx.put_reg(rd, result, guard);
}

/// `CLZ`.
pub(crate) fn emit_clz(ctx: &mut DecodeContext<'_>, rd: u8, rm: u8) {
    let value = ctx.read_reg(rm);
    let guard = ctx.guard;
    ctx.put_reg(rd, Expr::unop(UnOp::Clz32, value), guard);
}

/// APSR as MRS returns it: NZCV, Q and the GE bits.
pub(crate) fn read_apsr(ctx: &mut DecodeContext<'_>) -> Expr {
    let nzcv = flags::read_nzcv();
    let q = Expr::from1(Expr::cmp_ne32(Expr::get32(OFFB_QFLAG32), Expr::u32(0)));
    let mut apsr = Expr::or32(nzcv, Expr::shl32(q, 27));
    for lane in 0..4u8 {
        let ge = Expr::from1(Expr::cmp_ne32(Expr::get32(ge_offset(lane)), Expr::u32(0)));
        apsr = Expr::or32(apsr, Expr::shl32(ge, 16 + lane));
    }
    ctx.atom(apsr)
}

/// MSR to the APSR. Mask bit 3 writes NZCVQ, bit 2 the GE bits; the
/// system-level bits are not accessible here.
pub(crate) fn write_apsr(ctx: &mut DecodeContext<'_>, mask: u32, value: Expr) -> Outcome {
    if mask & 0b0011 != 0 || mask == 0 {
        return Outcome::Undefined;
    }
    let value = ctx.atom(value);
    let guard = ctx.guard;
    if mask & 0b1000 != 0 {
        flags::set_flags_copy(ctx, value.clone(), guard);
        let q = Expr::and32(value.clone(), Expr::u32(1 << 27));
        ctx.put_guarded(OFFB_QFLAG32, q, guard);
    }
    if mask & 0b0100 != 0 {
        for lane in 0..4u8 {
            let ge = Expr::and32(value.clone(), Expr::u32(1 << (16 + lane)));
            ctx.put_guarded(ge_offset(lane), ge, guard);
        }
    }
    Outcome::Lifted
}
