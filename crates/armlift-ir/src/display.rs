//! Text rendering of IR, in the usual `t3 = Add32(GET:I32(8),0x4:I32)` style.

use std::fmt;

use crate::block::IrBlock;
use crate::expr::Expr;
use crate::jump::JumpKind;
use crate::stmt::Stmt;
use crate::types::{Const, IrType, Temp};

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.bits())
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}:{}", self.as_u64(), self.ty())
    }
}

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for JumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(c) => write!(f, "{c}"),
            Self::Get { offset, ty } => write!(f, "GET:{ty}({offset})"),
            Self::RdTmp(t) => write!(f, "{t}"),
            Self::Unop { op, arg } => write!(f, "{}({arg})", op.name()),
            Self::Binop { op, left, right } => write!(f, "{}({left},{right})", op.name()),
            Self::Ite {
                cond,
                iftrue,
                iffalse,
            } => write!(f, "ITE({cond},{iftrue},{iffalse})"),
            Self::Load { ty, addr } => write!(f, "LDle:{ty}({addr})"),
            Self::CCall {
                callee,
                ret_ty,
                args,
            } => {
                write!(f, "{callee}{{{ret_ty}}}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IMark { addr, len, delta } => {
                write!(f, "------ IMark({addr:#x}, {len}, {delta}) ------")
            }
            Self::WrTmp { tmp, data } => write!(f, "{tmp} = {data}"),
            Self::Put { offset, data } => write!(f, "PUT({offset}) = {data}"),
            Self::Store { addr, data } => write!(f, "STle({addr}) = {data}"),
            Self::StoreG { addr, data, guard } => {
                write!(f, "if ({guard}) STle({addr}) = {data}")
            }
            Self::LoadG {
                dst,
                cvt,
                addr,
                alt,
                guard,
            } => write!(
                f,
                "{dst} = if ({guard}) {}(LDle:{}({addr})) else {alt}",
                cvt.name(),
                cvt.mem_type()
            ),
            Self::Exit { guard, jk, dst } => {
                write!(f, "if ({guard}) {{ goto {dst:#x}; exit-{jk} }}")
            }
            Self::Fence => f.write_str("MBusEvent-Fence"),
        }
    }
}

impl fmt::Display for IrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IRSB {{")?;
        if !self.temps().is_empty() {
            f.write_str("   ")?;
            for (i, ty) in self.temps().iter().enumerate() {
                write!(f, "t{i}:{ty} ")?;
            }
            writeln!(f)?;
            writeln!(f)?;
        }
        for stmt in self.stmts() {
            writeln!(f, "   {stmt}")?;
        }
        if let Some(next) = self.next() {
            writeln!(f, "   goto {next}; exit-{}", self.jumpkind())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_expr() {
        let e = Expr::add32(Expr::get32(8), Expr::u32(4));
        assert_eq!(e.to_string(), "Add32(GET:I32(8),0x4:I32)");
    }

    #[test]
    fn test_display_stmts() {
        assert_eq!(
            Stmt::imark(0x1000, 4, 0).to_string(),
            "------ IMark(0x1000, 4, 0) ------"
        );
        assert_eq!(
            Stmt::exit(Expr::u1(true), JumpKind::Syscall, 0x1004).to_string(),
            "if (0x1:I1) { goto 0x1004; exit-Sys_syscall }"
        );
    }

    #[test]
    fn test_display_block() {
        let mut b = IrBlock::new();
        let t = b.bind(Expr::get32(0));
        b.put(4, Expr::tmp(t));
        b.set_next(Expr::u32(0x2000), JumpKind::Ret);
        let text = b.to_string();
        assert!(text.contains("t0:I32"));
        assert!(text.contains("PUT(4) = t0"));
        assert!(text.contains("goto 0x2000:I32; exit-Ret"));
    }
}
