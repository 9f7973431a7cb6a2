//! Single-entry, multi-exit IR blocks.

use crate::expr::Expr;
use crate::jump::JumpKind;
use crate::stmt::Stmt;
use crate::types::{IrType, Temp};

/// Position in a block that can be rolled back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark {
    stmts: usize,
    temps: usize,
}

/// IR block under construction or finished.
///
/// Every temporary is assigned exactly once and before any use; `push`
/// enforces this along with operand typing.
#[derive(Clone, Debug, Default)]
pub struct IrBlock {
    tyenv: Vec<IrType>,
    assigned: Vec<bool>,
    stmts: Vec<Stmt>,
    next: Option<Expr>,
    jumpkind: JumpKind,
}

impl IrBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, not yet assigned temporary.
    pub fn new_temp(&mut self, ty: IrType) -> Temp {
        let idx = u32::try_from(self.tyenv.len()).unwrap_or(u32::MAX);
        self.tyenv.push(ty);
        self.assigned.push(false);
        Temp(idx)
    }

    pub fn temp_type(&self, t: Temp) -> IrType {
        self.tyenv[t.index()]
    }

    /// Declared types of all temporaries, indexed by `Temp::index`.
    pub fn temps(&self) -> &[IrType] {
        &self.tyenv
    }

    /// Type of an expression in this block's environment.
    pub fn type_of(&self, e: &Expr) -> IrType {
        e.ty(&self.tyenv)
    }

    /// Assign `data` to `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` was already assigned or the types differ.
    pub fn assign(&mut self, t: Temp, data: Expr) {
        self.push(Stmt::WrTmp { tmp: t, data });
    }

    /// Bind `data` to a fresh temporary of its own type.
    pub fn bind(&mut self, data: Expr) -> Temp {
        let t = self.new_temp(self.type_of(&data));
        self.assign(t, data);
        t
    }

    pub fn put(&mut self, offset: u32, data: Expr) {
        self.push(Stmt::put(offset, data));
    }

    /// Append a statement.
    ///
    /// # Panics
    ///
    /// Panics if the statement reads an unassigned temporary, assigns a
    /// temporary twice, or is ill-typed.
    pub fn push(&mut self, stmt: Stmt) {
        stmt.for_each_expr(&mut |e| {
            e.for_each_tmp(&mut |t| {
                assert!(self.assigned[t.index()], "{t:?} read before assignment");
            });
        });
        match &stmt {
            Stmt::WrTmp { tmp, data } => {
                self.claim(*tmp);
                let ty = self.type_of(data);
                assert_eq!(ty, self.temp_type(*tmp), "type mismatch assigning {tmp:?}");
            }
            Stmt::Put { data, .. } => {
                self.type_of(data);
            }
            Stmt::Store { addr, data } => {
                self.expect(addr, IrType::I32, "store address");
                self.type_of(data);
            }
            Stmt::StoreG { addr, data, guard } => {
                self.expect(addr, IrType::I32, "store address");
                self.expect(guard, IrType::I1, "store guard");
                self.type_of(data);
            }
            Stmt::LoadG {
                dst,
                addr,
                alt,
                guard,
                ..
            } => {
                self.claim(*dst);
                assert_eq!(self.temp_type(*dst), IrType::I32, "guarded load target");
                self.expect(addr, IrType::I32, "load address");
                self.expect(alt, IrType::I32, "load alternative");
                self.expect(guard, IrType::I1, "load guard");
            }
            Stmt::Exit { guard, .. } => self.expect(guard, IrType::I1, "exit guard"),
            Stmt::IMark { .. } | Stmt::Fence => {}
        }
        self.stmts.push(stmt);
    }

    fn claim(&mut self, t: Temp) {
        let slot = &mut self.assigned[t.index()];
        assert!(!*slot, "{t:?} assigned twice");
        *slot = true;
    }

    fn expect(&self, e: &Expr, ty: IrType, what: &str) {
        assert_eq!(self.type_of(e), ty, "{what} must be {ty:?}");
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    pub(crate) fn stmts_mut(&mut self) -> &mut Vec<Stmt> {
        &mut self.stmts
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Number of guest instructions covered (one `IMark` each).
    pub fn instruction_count(&self) -> usize {
        self.stmts
            .iter()
            .filter(|s| matches!(s, Stmt::IMark { .. }))
            .count()
    }

    /// Remember the current position.
    pub fn mark(&self) -> Mark {
        Mark {
            stmts: self.stmts.len(),
            temps: self.tyenv.len(),
        }
    }

    /// Drop everything appended since `mark`.
    pub fn rollback(&mut self, mark: Mark) {
        self.stmts.truncate(mark.stmts);
        self.tyenv.truncate(mark.temps);
        self.assigned.truncate(mark.temps);
    }

    /// Set the fall-off destination and its jump kind.
    ///
    /// # Panics
    ///
    /// Panics if `next` is not `I32` or reads an unassigned temporary.
    pub fn set_next(&mut self, next: Expr, jk: JumpKind) {
        self.expect(&next, IrType::I32, "block next");
        next.for_each_tmp(&mut |t| {
            assert!(self.assigned[t.index()], "{t:?} read before assignment");
        });
        self.next = Some(next);
        self.jumpkind = jk;
    }

    pub(crate) const fn next_mut(&mut self) -> Option<&mut Expr> {
        self.next.as_mut()
    }

    pub const fn next(&self) -> Option<&Expr> {
        self.next.as_ref()
    }

    pub const fn jumpkind(&self) -> JumpKind {
        self.jumpkind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_allocates_typed_temp() {
        let mut b = IrBlock::new();
        let t = b.bind(Expr::cmp_eq32(Expr::get32(0), Expr::u32(0)));
        assert_eq!(b.temp_type(t), IrType::I1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    #[should_panic(expected = "assigned twice")]
    fn test_double_assignment_panics() {
        let mut b = IrBlock::new();
        let t = b.new_temp(IrType::I32);
        b.assign(t, Expr::u32(1));
        b.assign(t, Expr::u32(2));
    }

    #[test]
    #[should_panic(expected = "read before assignment")]
    fn test_read_before_write_panics() {
        let mut b = IrBlock::new();
        let t = b.new_temp(IrType::I32);
        b.put(0, Expr::tmp(t));
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn test_assign_type_mismatch_panics() {
        let mut b = IrBlock::new();
        let t = b.new_temp(IrType::I1);
        b.assign(t, Expr::u32(1));
    }

    #[test]
    #[should_panic(expected = "exit guard")]
    fn test_exit_guard_must_be_i1() {
        let mut b = IrBlock::new();
        b.push(Stmt::exit(Expr::u32(1), JumpKind::Boring, 0));
    }

    #[test]
    fn test_rollback_releases_temps() {
        let mut b = IrBlock::new();
        b.push(Stmt::imark(0x1000, 4, 0));
        let m = b.mark();
        let t = b.bind(Expr::get32(0));
        b.put(4, Expr::tmp(t));
        b.rollback(m);
        assert_eq!(b.len(), 1);
        assert!(b.temps().is_empty());
        // The slot can be reused after rollback.
        let t2 = b.bind(Expr::u32(3));
        assert_eq!(t2.index(), 0);
    }

    #[test]
    fn test_instruction_count() {
        let mut b = IrBlock::new();
        b.push(Stmt::imark(0x1000, 4, 0));
        b.put(0, Expr::u32(1));
        b.push(Stmt::imark(0x1004, 4, 0));
        assert_eq!(b.instruction_count(), 2);
    }
}
