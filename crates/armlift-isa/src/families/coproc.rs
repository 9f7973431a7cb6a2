//! Coprocessor space shared by A32 and T32: the CP15 thread ID registers
//! and the Advanced SIMD saturating add/subtract on 32-bit lanes.
//!
//! Both encodings are the same 32 bits apart from the top byte, so the T32
//! family rewrites its word into the A32 form and shares the lifting.
//! Everything else in these spaces is left for VFP and Advanced SIMD
//! families plugged in after the standard chains.

use armlift_ir::{BinOp, Expr};

use crate::bits::{bit, field, matches, reg};
use crate::config::HwCaps;
use crate::context::DecodeContext;
use crate::families::{InstructionFamily, Outcome};
use crate::flags::set_fpscr_qc;
use crate::layout::{OFFB_TPIDRURO, OFFB_TPIDRURW, dreg_offset};
use crate::types::REG_PC;

pub struct A32Coproc;

impl InstructionFamily for A32Coproc {
    fn name(&self) -> &'static str {
        "a32-coproc"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        if insn >> 28 == 0xf {
            return simd_qaddsub(ctx, insn);
        }
        thread_register(ctx, insn)
    }
}

pub struct T32Coproc;

impl InstructionFamily for T32Coproc {
    fn name(&self) -> &'static str {
        "t32-coproc"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        // 111U 1111: Advanced SIMD data processing, U moved to bit 24
        if matches(insn, 0xef00_0000, 0xef00_0000) {
            let u = (insn >> 28) & 1;
            return simd_qaddsub(ctx, 0xf200_0000 | (u << 24) | (insn & 0x00ff_ffff));
        }
        if matches(insn, 0xff00_0000, 0xee00_0000) {
            return thread_register(ctx, insn);
        }
        Outcome::NotMatched
    }
}

/// `MRC/MCR p15, 0, Rt, c13, c0, {2,3}`: user thread ID registers.
fn thread_register(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    // xxxx 1110 000L 1101 Rt 1111 opc2 1 0000
    if !matches(insn, 0x0fef_0f1f, 0x0e0d_0f10) {
        return Outcome::NotMatched;
    }
    let slot = match field(insn, 7, 5) {
        2 => OFFB_TPIDRURW,
        3 => OFFB_TPIDRURO,
        _ => return Outcome::NotMatched,
    };
    let rt = reg(insn, 12);
    if !ctx.arch().has_v6() || rt == REG_PC {
        return Outcome::Undefined;
    }
    let guard = ctx.guard;
    if bit(insn, 20) {
        ctx.put_reg(rt, Expr::get32(slot), guard);
    } else {
        // TPIDRURO is read-only at user level
        if slot == OFFB_TPIDRURO {
            return Outcome::Undefined;
        }
        let value = ctx.read_reg(rt);
        ctx.put_guarded(slot, value, guard);
    }
    Outcome::Lifted
}

/// `VQADD` and `VQSUB` with 32-bit lanes, signed or unsigned, on D or Q
/// registers. Saturation in any lane sets FPSCR.QC.
fn simd_qaddsub(ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
    // 1111 001U 0D10 Vn Vd 00s0 NQM1 Vm
    if !matches(insn, 0xfeb0_0d10, 0xf220_0010) || !ctx.arch().hwcaps.contains(HwCaps::NEON) {
        return Outcome::NotMatched;
    }
    let (unsigned, sub, quad) = (bit(insn, 24), bit(insn, 9), bit(insn, 6));
    let vd = (u8::from(bit(insn, 22)) << 4) | reg(insn, 12);
    let vn = (u8::from(bit(insn, 7)) << 4) | reg(insn, 16);
    let vm = (u8::from(bit(insn, 5)) << 4) | reg(insn, 0);
    if quad && (vd | vn | vm) & 1 != 0 {
        return Outcome::Undefined;
    }
    let dregs = if quad { 2 } else { 1 };

    // read every source lane before writing, the registers may overlap
    let mut results = Vec::new();
    for i in 0..dregs {
        let lanes = [0u32, 4].map(|half| {
            let lane = |r: u8| dreg_offset(r + i) + half;
            let n = ctx.atom(Expr::get32(lane(vn)));
            let m = ctx.atom(Expr::get32(lane(vm)));
            let (sat, wrap) = saturate(n, m, unsigned, sub);
            (ctx.atom(sat), ctx.atom(wrap))
        });
        results.push((i, lanes));
    }

    let guard = ctx.guard;
    for (i, [(sat_lo, wrap_lo), (sat_hi, wrap_hi)]) in results {
        let base = dreg_offset(vd + i);
        ctx.put_guarded(base, sat_lo.clone(), guard);
        ctx.put_guarded(base + 4, sat_hi.clone(), guard);
        set_fpscr_qc(ctx, [sat_lo, sat_hi], [wrap_lo, wrap_hi], guard);
    }
    Outcome::Lifted
}

/// Saturated and wrapping results of one lane.
fn saturate(n: Expr, m: Expr, unsigned: bool, sub: bool) -> (Expr, Expr) {
    let wrap = if sub {
        Expr::sub32(n.clone(), m.clone())
    } else {
        Expr::add32(n.clone(), m.clone())
    };
    let sat = match (unsigned, sub) {
        (false, false) => Expr::binop(BinOp::QAdd32S, n, m),
        (false, true) => Expr::binop(BinOp::QSub32S, n, m),
        (true, false) => Expr::ite(Expr::cmp_lt32u(wrap.clone(), n), Expr::u32(u32::MAX), wrap.clone()),
        (true, true) => Expr::ite(Expr::cmp_lt32u(n, m), Expr::u32(0), wrap.clone()),
    };
    (sat, wrap)
}
