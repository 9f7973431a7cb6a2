//! Guard and predication engine.
//!
//! Turns an A32 condition field or the Thumb IT state into a [`Guard`] for
//! the current instruction, and owns the per-instruction ITSTATE update.

use armlift_ir::{Expr, JumpKind, Stmt, Temp};
use tracing::trace;

use crate::config::ItMode;
use crate::context::DecodeContext;
use crate::flags;
use crate::it_state::ItState;
use crate::layout::{OFFB_CC_DEP1, OFFB_CC_DEP2, OFFB_CC_NDEP, OFFB_CC_OP, OFFB_ITSTATE};

/// Condition under which an instruction's effects happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guard {
    Always,
    /// An `I1` temporary.
    When(Temp),
}

impl Guard {
    pub const fn is_always(self) -> bool {
        matches!(self, Self::Always)
    }

    /// The guard as an `I1` expression.
    pub const fn expr(self) -> Expr {
        match self {
            Self::Always => Expr::u1(true),
            Self::When(t) => Expr::tmp(t),
        }
    }
}

/// How the current Thumb instruction learned its IT state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItTrack {
    /// A32: no IT state.
    None,
    /// No preceding halfword can be an IT, so the state is known to be zero.
    Unconditional,
    Static(ItState),
    /// Old and shifted ITSTATE, both `I32`.
    Dynamic { old: Temp, new: Temp },
}

/// Number of preceding halfwords that could hold a governing IT.
const IT_LOOKBACK_HALFWORDS: usize = 9;

/// Check that none of the halfwords before `delta` can be an IT instruction
/// whose block covers the instruction at `delta`.
///
/// Halfwords before the start of `code` are unknown, so fewer than nine
/// visible halfwords means "not guaranteed".
pub fn guaranteed_unconditional(code: &[u8], delta: usize) -> bool {
    if delta < 2 * IT_LOOKBACK_HALFWORDS || delta > code.len() {
        return false;
    }
    (1..=IT_LOOKBACK_HALFWORDS).all(|i| {
        let at = delta - 2 * i;
        let hw = u16::from_le_bytes([code[at], code[at + 1]]);
        !(hw & 0xff00 == 0xbf00 && hw & 0x000f != 0)
    })
}

/// Set up guards and ITSTATE for the Thumb instruction at `ctx.pc`.
pub(crate) fn begin_thumb(ctx: &mut DecodeContext<'_>, code: &[u8], delta: usize, mode: ItMode) {
    match mode {
        ItMode::Known(state) => {
            ctx.irsb.put(OFFB_ITSTATE, Expr::u32(state.advance().raw()));
            ctx.guard = flags::condition(ctx, state.current_cond());
            ctx.flag_guard = if state.in_block() {
                None
            } else {
                Some(Guard::Always)
            };
            ctx.it = ItTrack::Static(state);
        }
        ItMode::Dynamic if ctx.opts.it_lookback && guaranteed_unconditional(code, delta) => {
            ctx.irsb.put(OFFB_ITSTATE, Expr::u32(0));
            ctx.guard = Guard::Always;
            ctx.flag_guard = Some(Guard::Always);
            ctx.it = ItTrack::Unconditional;
        }
        ItMode::Dynamic => {
            let old = ctx.bind(Expr::get32(OFFB_ITSTATE));
            let new = ctx.bind(Expr::shr32(Expr::tmp(old), 8));
            ctx.irsb.put(OFFB_ITSTATE, Expr::tmp(new));

            let lane = Expr::and32(Expr::tmp(old), Expr::u32(0xf0));
            let cond_word = ctx.bind(Expr::ccall(
                flags::HELPER_CONDITION,
                armlift_ir::IrType::I32,
                vec![
                    Expr::or32(
                        Expr::xor32(lane.clone(), Expr::u32(0xe0)),
                        Expr::get32(OFFB_CC_OP),
                    ),
                    Expr::get32(OFFB_CC_DEP1),
                    Expr::get32(OFFB_CC_DEP2),
                    Expr::get32(OFFB_CC_NDEP),
                ],
            ));
            let cond_t = ctx.bind(Expr::ite(
                Expr::cmp_ne32(lane, Expr::u32(0)),
                Expr::to1(Expr::tmp(cond_word)),
                Expr::u1(true),
            ));
            let not_in_it = ctx.bind(Expr::cmp_eq32(
                Expr::and32(Expr::tmp(old), Expr::u32(1)),
                Expr::u32(0),
            ));
            let cond_and_not_in_it = ctx.bind(Expr::and1(Expr::tmp(cond_t), Expr::tmp(not_in_it)));
            ctx.guard = Guard::When(cond_t);
            ctx.flag_guard = Some(Guard::When(cond_and_not_in_it));
            ctx.it = ItTrack::Dynamic { old, new };
        }
    }
    trace!(pc = ctx.pc, it = ?ctx.it, "thumb guard");
}

/// Raise SIGILL (as a `NoDecode` exit) when `fault` holds, with ITSTATE
/// backed out so the instruction can be restarted.
fn sigill_when(ctx: &mut DecodeContext<'_>, fault: Expr, old: Expr, new: Expr) {
    let here = ctx.pc | 1;
    ctx.irsb.put(OFFB_ITSTATE, old);
    ctx.irsb.push(Stmt::exit(fault, JumpKind::NoDecode, here));
    ctx.irsb.put(OFFB_ITSTATE, new);
}

/// For encodings that are unpredictable anywhere inside an IT block.
pub(crate) fn sigill_if_in_it_block(ctx: &mut DecodeContext<'_>) {
    match ctx.it {
        ItTrack::None | ItTrack::Unconditional => {}
        ItTrack::Static(state) => {
            if state.in_block() {
                let (old, new) = (state.raw(), state.advance().raw());
                sigill_when(ctx, Expr::u1(true), Expr::u32(old), Expr::u32(new));
            }
        }
        ItTrack::Dynamic { old, new } => {
            let fault = Expr::cmp_ne32(Expr::tmp(old), Expr::u32(0));
            sigill_when(ctx, fault, Expr::tmp(old), Expr::tmp(new));
        }
    }
}

/// For encodings that may only be the last instruction of an IT block.
pub(crate) fn sigill_if_in_but_not_last(ctx: &mut DecodeContext<'_>) {
    match ctx.it {
        ItTrack::None | ItTrack::Unconditional => {}
        ItTrack::Static(state) => {
            if state.in_block() && !state.is_last() {
                let (old, new) = (state.raw(), state.advance().raw());
                sigill_when(ctx, Expr::u1(true), Expr::u32(old), Expr::u32(new));
            }
        }
        ItTrack::Dynamic { old, new } => {
            let fault = Expr::cmp_ne32(Expr::tmp(new), Expr::u32(0));
            sigill_when(ctx, fault, Expr::tmp(old), Expr::tmp(new));
        }
    }
}

/// Leave the block for the next instruction when the guard is false, then
/// treat the rest of the instruction as unconditional.
///
/// Used before effects that cannot be made conditional, such as a system
/// call or a multi-register load.
pub(crate) fn skip_if_false(ctx: &mut DecodeContext<'_>) {
    if let Guard::When(t) = ctx.guard {
        let next = ctx.next_pc_tagged();
        ctx.irsb
            .push(Stmt::exit(Expr::not1(Expr::tmp(t)), JumpKind::Boring, next));
        ctx.guard = Guard::Always;
    }
}
