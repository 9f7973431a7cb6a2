//! Statement IR.

use crate::expr::Expr;
use crate::jump::JumpKind;
use crate::types::{IrType, Temp};

/// Widening applied by a guarded load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadCvt {
    Ident32,
    Zext8To32,
    Sext8To32,
    Zext16To32,
    Sext16To32,
}

impl LoadCvt {
    /// Memory access type.
    pub const fn mem_type(self) -> IrType {
        match self {
            Self::Ident32 => IrType::I32,
            Self::Zext8To32 | Self::Sext8To32 => IrType::I8,
            Self::Zext16To32 | Self::Sext16To32 => IrType::I16,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ident32 => "ident32",
            Self::Zext8To32 => "8Uto32",
            Self::Sext8To32 => "8Sto32",
            Self::Zext16To32 => "16Uto32",
            Self::Sext16To32 => "16Sto32",
        }
    }
}

/// IR statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// Start of a guest instruction.
    IMark { addr: u32, len: u32, delta: u8 },
    /// Assign a temporary.
    WrTmp { tmp: Temp, data: Expr },
    /// Write a guest state slot.
    Put { offset: u32, data: Expr },
    /// Little-endian memory write.
    Store { addr: Expr, data: Expr },
    /// Memory write performed only when `guard` is true.
    StoreG { addr: Expr, data: Expr, guard: Expr },
    /// Memory read performed only when `guard` is true; otherwise `dst`
    /// receives `alt`.
    LoadG {
        dst: Temp,
        cvt: LoadCvt,
        addr: Expr,
        alt: Expr,
        guard: Expr,
    },
    /// Leave the block to `dst` when `guard` holds.
    Exit {
        guard: Expr,
        jk: JumpKind,
        dst: u32,
    },
    /// Memory barrier.
    Fence,
}

impl Stmt {
    pub const fn imark(addr: u32, len: u32, delta: u8) -> Self {
        Self::IMark { addr, len, delta }
    }

    pub const fn put(offset: u32, data: Expr) -> Self {
        Self::Put { offset, data }
    }

    pub const fn store(addr: Expr, data: Expr) -> Self {
        Self::Store { addr, data }
    }

    pub const fn exit(guard: Expr, jk: JumpKind, dst: u32) -> Self {
        Self::Exit { guard, jk, dst }
    }

    /// Check if this is a side exit.
    pub const fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }

    /// Visit every expression operand.
    pub fn for_each_expr(&self, f: &mut impl FnMut(&Expr)) {
        match self {
            Self::IMark { .. } | Self::Fence => {}
            Self::WrTmp { data, .. } | Self::Put { data, .. } => f(data),
            Self::Store { addr, data } => {
                f(addr);
                f(data);
            }
            Self::StoreG { addr, data, guard } => {
                f(addr);
                f(data);
                f(guard);
            }
            Self::LoadG {
                addr, alt, guard, ..
            } => {
                f(addr);
                f(alt);
                f(guard);
            }
            Self::Exit { guard, .. } => f(guard),
        }
    }

    /// Rewrite every expression operand in place.
    pub fn map_exprs(&mut self, f: &mut impl FnMut(Expr) -> Expr) {
        let mut apply = |e: &mut Expr| {
            let taken = std::mem::replace(e, Expr::u1(false));
            *e = f(taken);
        };
        match self {
            Self::IMark { .. } | Self::Fence => {}
            Self::WrTmp { data, .. } | Self::Put { data, .. } => apply(data),
            Self::Store { addr, data } => {
                apply(addr);
                apply(data);
            }
            Self::StoreG { addr, data, guard } => {
                apply(addr);
                apply(data);
                apply(guard);
            }
            Self::LoadG {
                addr, alt, guard, ..
            } => {
                apply(addr);
                apply(alt);
                apply(guard);
            }
            Self::Exit { guard, .. } => apply(guard),
        }
    }
}
