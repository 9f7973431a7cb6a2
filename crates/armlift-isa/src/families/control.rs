//! Branches and system calls shared by the A32 and Thumb encodings.

use armlift_ir::{Expr, JumpKind, Stmt};
use tracing::trace;

use crate::context::{DecodeContext, Flow};
use crate::guard::{self, Guard};

/// Direct branch to `dst` (instruction-set bit included).
///
/// An unconditional branch whose target the caller accepts is resteered.
/// A conditional one is either chased in its statically likely direction
/// (backward taken, forward not taken) with a side exit for the other, or
/// turned into a side exit to `dst` followed by a fall-through stop.
pub(crate) fn emit_direct_branch(ctx: &mut DecodeContext<'_>, dst: u32, jk: JumpKind) {
    match ctx.guard {
        Guard::Always => {
            if (ctx.resteer_ok)(dst) {
                trace!(pc = ctx.pc, dst, "resteer");
                ctx.flow = Flow::Resteer {
                    target: dst,
                    conditional: false,
                };
            } else {
                ctx.write_pc(Expr::u32(dst), Guard::Always, jk);
            }
        }
        Guard::When(g) if jk == JumpKind::Boring => {
            let next = ctx.next_pc_tagged();
            if ctx.opts.chase_cond && (ctx.resteer_ok)(dst) {
                let (exit_guard, exit_dst, target) = if dst & !1 <= ctx.pc {
                    (Expr::not1(Expr::tmp(g)), next, dst)
                } else {
                    (Expr::tmp(g), dst, next)
                };
                ctx.stmt(Stmt::exit(exit_guard, JumpKind::Boring, exit_dst));
                trace!(pc = ctx.pc, target, "conditional resteer");
                ctx.flow = Flow::Resteer {
                    target,
                    conditional: true,
                };
            } else {
                ctx.stmt(Stmt::exit(Expr::tmp(g), JumpKind::Boring, dst));
                ctx.write_pc(Expr::u32(next), Guard::Always, JumpKind::Boring);
            }
        }
        guard @ Guard::When(_) => ctx.write_pc(Expr::u32(dst), guard, jk),
    }
}

/// `SVC`: leave the block at the next instruction with a syscall exit.
pub(crate) fn emit_svc(ctx: &mut DecodeContext<'_>) {
    guard::skip_if_false(ctx);
    let next = ctx.next_pc_tagged();
    ctx.write_pc(Expr::u32(next), Guard::Always, JumpKind::Syscall);
}

/// `YIELD`: fall through, but give the scheduler a chance to run.
pub(crate) fn emit_yield(ctx: &mut DecodeContext<'_>) {
    guard::skip_if_false(ctx);
    let next = ctx.next_pc_tagged();
    ctx.write_pc(Expr::u32(next), Guard::Always, JumpKind::Yield);
}
