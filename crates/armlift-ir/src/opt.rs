//! Block-local cleanup passes.
//!
//! These only ever remove reads or fold expressions; they never change what
//! a block does. Architecture-specific folding is plugged in through
//! [`rewrite_ccalls`].

use rustc_hash::{FxHashMap, FxHashSet};

use crate::block::IrBlock;
use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::types::{IrType, Temp};

fn is_atom(e: &Expr) -> bool {
    matches!(e, Expr::Const(_) | Expr::RdTmp(_))
}

fn overlaps(a: u32, a_ty: IrType, b: u32, b_ty: IrType) -> bool {
    let a_end = a + a_ty.bytes() as u32;
    let b_end = b + b_ty.bytes() as u32;
    a < b_end && b < a_end
}

type SlotMap = FxHashMap<u32, (IrType, Expr)>;

fn substitute(e: Expr, slots: &SlotMap, bound: &FxHashMap<Temp, Expr>) -> Expr {
    e.rewrite(&mut |n| match n {
        Expr::Get { offset, ty } => match slots.get(&offset) {
            Some((slot_ty, atom)) if *slot_ty == ty => atom.clone(),
            _ => n,
        },
        Expr::RdTmp(t) => bound.get(&t).cloned().unwrap_or(n),
        other => other,
    })
}

/// Forward constants and copies bound to temporaries, and atoms written by
/// `Put` to later `Get`s of the same slot.
pub fn forward_puts(block: &mut IrBlock) {
    let temps = block.temps().to_vec();
    let mut slots = SlotMap::default();
    let mut bound: FxHashMap<Temp, Expr> = FxHashMap::default();

    for stmt in block.stmts_mut().iter_mut() {
        stmt.map_exprs(&mut |e| substitute(e, &slots, &bound));
        match stmt {
            Stmt::WrTmp { tmp, data } if is_atom(data) => {
                bound.insert(*tmp, data.clone());
            }
            Stmt::Put { offset, data } => {
                let ty = data.ty(&temps);
                slots.retain(|o, (t, _)| !overlaps(*o, *t, *offset, ty));
                if is_atom(data) {
                    slots.insert(*offset, (ty, data.clone()));
                }
            }
            _ => {}
        }
    }
    if let Some(next) = block.next_mut() {
        let taken = std::mem::replace(next, Expr::u32(0));
        *next = substitute(taken, &slots, &bound);
    }
}

/// Offer every helper call to `f`; a returned expression replaces the call.
pub fn rewrite_ccalls(block: &mut IrBlock, f: impl Fn(&'static str, &[Expr]) -> Option<Expr>) {
    let mut visit = |n: Expr| {
        if let Expr::CCall { callee, args, .. } = &n {
            if let Some(replacement) = f(*callee, args) {
                return replacement;
            }
        }
        n
    };
    for stmt in block.stmts_mut().iter_mut() {
        stmt.map_exprs(&mut |e| e.rewrite(&mut visit));
    }
    if let Some(next) = block.next_mut() {
        let taken = std::mem::replace(next, Expr::u32(0));
        *next = taken.rewrite(&mut visit);
    }
}

fn has_load(e: &Expr) -> bool {
    match e {
        Expr::Load { .. } => true,
        Expr::Const(_) | Expr::Get { .. } | Expr::RdTmp(_) => false,
        Expr::Unop { arg, .. } => has_load(arg),
        Expr::Binop { left, right, .. } => has_load(left) || has_load(right),
        Expr::Ite {
            cond,
            iftrue,
            iffalse,
        } => has_load(cond) || has_load(iftrue) || has_load(iffalse),
        Expr::CCall { args, .. } => args.iter().any(has_load),
    }
}

/// Drop assignments to temporaries nobody reads. Loads are kept since they
/// may fault.
pub fn remove_dead_temps(block: &mut IrBlock) {
    let mut live: FxHashSet<Temp> = FxHashSet::default();
    if let Some(next) = block.next() {
        next.for_each_tmp(&mut |t| {
            live.insert(t);
        });
    }
    let stmts = std::mem::take(block.stmts_mut());
    let mut kept = Vec::with_capacity(stmts.len());
    for stmt in stmts.into_iter().rev() {
        if let Stmt::WrTmp { tmp, data } = &stmt {
            if !live.contains(tmp) && !has_load(data) {
                continue;
            }
        }
        stmt.for_each_expr(&mut |e| {
            e.for_each_tmp(&mut |t| {
                live.insert(t);
            });
        });
        kept.push(stmt);
    }
    kept.reverse();
    *block.stmts_mut() = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jump::JumpKind;

    #[test]
    fn test_forward_put_to_get() {
        let mut b = IrBlock::new();
        let t = b.bind(Expr::get32(8));
        b.put(0, Expr::tmp(t));
        let u = b.bind(Expr::add32(Expr::get32(0), Expr::u32(1)));
        b.put(4, Expr::tmp(u));
        b.set_next(Expr::u32(0), JumpKind::Boring);

        forward_puts(&mut b);
        assert_eq!(
            b.stmts()[2],
            Stmt::WrTmp {
                tmp: u,
                data: Expr::add32(Expr::tmp(t), Expr::u32(1))
            }
        );
    }

    #[test]
    fn test_forward_stops_at_non_atom_put() {
        let mut b = IrBlock::new();
        b.put(0, Expr::u32(5));
        b.put(0, Expr::add32(Expr::get32(8), Expr::u32(1)));
        let t = b.bind(Expr::get32(0));
        b.put(4, Expr::tmp(t));
        b.set_next(Expr::u32(0), JumpKind::Boring);

        forward_puts(&mut b);
        assert_eq!(
            b.stmts()[2],
            Stmt::WrTmp {
                tmp: t,
                data: Expr::get32(0)
            }
        );
    }

    #[test]
    fn test_constant_temps_fold_through() {
        let mut b = IrBlock::new();
        let t = b.bind(Expr::u32(3));
        let u = b.bind(Expr::add32(Expr::tmp(t), Expr::u32(4)));
        b.set_next(Expr::tmp(u), JumpKind::Boring);

        forward_puts(&mut b);
        assert_eq!(b.next(), Some(&Expr::u32(7)));
    }

    #[test]
    fn test_rewrite_ccalls_and_dead_temps() {
        let mut b = IrBlock::new();
        let t = b.bind(Expr::ccall("answer", IrType::I32, vec![]));
        b.put(0, Expr::tmp(t));
        let unused = b.bind(Expr::ccall("other", IrType::I32, vec![]));
        b.set_next(Expr::u32(0), JumpKind::Boring);

        rewrite_ccalls(&mut b, |name, _| (name == "answer").then(|| Expr::u32(42)));
        remove_dead_temps(&mut b);
        assert!(!b.stmts().iter().any(
            |s| matches!(s, Stmt::WrTmp { tmp, .. } if *tmp == unused)
        ));
        assert_eq!(
            b.stmts()[0],
            Stmt::WrTmp {
                tmp: t,
                data: Expr::u32(42)
            }
        );
    }

    #[test]
    fn test_dead_loads_are_kept() {
        let mut b = IrBlock::new();
        b.bind(Expr::load(IrType::I32, Expr::u32(0x100)));
        b.set_next(Expr::u32(0), JumpKind::Boring);
        remove_dead_temps(&mut b);
        assert_eq!(b.len(), 1);
    }
}
