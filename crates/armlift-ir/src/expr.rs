//! Expression IR.
//!
//! Expressions are side-effect free trees. The factory methods below fold
//! constants as they build, so lifters can compose freely without
//! producing `Add32(0x4:I32,0x8:I32)` style noise.

use crate::ops::{BinOp, UnOp};
use crate::types::{Const, IrType, Temp};

/// Expression tree node.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expr {
    Const(Const),
    /// Read a guest state slot.
    Get {
        offset: u32,
        ty: IrType,
    },
    RdTmp(Temp),
    Unop {
        op: UnOp,
        arg: Box<Self>,
    },
    Binop {
        op: BinOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Ite {
        cond: Box<Self>,
        iftrue: Box<Self>,
        iffalse: Box<Self>,
    },
    /// Little-endian memory read.
    Load {
        ty: IrType,
        addr: Box<Self>,
    },
    /// Call to a pure helper function.
    CCall {
        callee: &'static str,
        ret_ty: IrType,
        args: Vec<Self>,
    },
}

impl From<Temp> for Expr {
    fn from(t: Temp) -> Self {
        Self::RdTmp(t)
    }
}

impl From<Const> for Expr {
    fn from(c: Const) -> Self {
        Self::Const(c)
    }
}

// These are factory methods, not trait implementations
#[allow(clippy::should_implement_trait)]
impl Expr {
    pub const fn u1(b: bool) -> Self {
        Self::Const(Const::U1(b))
    }

    pub const fn u8(v: u8) -> Self {
        Self::Const(Const::U8(v))
    }

    pub const fn u32(v: u32) -> Self {
        Self::Const(Const::U32(v))
    }

    pub const fn u64(v: u64) -> Self {
        Self::Const(Const::U64(v))
    }

    pub const fn get(offset: u32, ty: IrType) -> Self {
        Self::Get { offset, ty }
    }

    /// Read a 32-bit guest state slot.
    pub const fn get32(offset: u32) -> Self {
        Self::Get {
            offset,
            ty: IrType::I32,
        }
    }

    pub const fn tmp(t: Temp) -> Self {
        Self::RdTmp(t)
    }

    pub fn load(ty: IrType, addr: Self) -> Self {
        Self::Load {
            ty,
            addr: Box::new(addr),
        }
    }

    pub const fn ccall(callee: &'static str, ret_ty: IrType, args: Vec<Self>) -> Self {
        Self::CCall {
            callee,
            ret_ty,
            args,
        }
    }

    /// Constant value, if this is a constant.
    pub const fn as_const(&self) -> Option<u64> {
        match self {
            Self::Const(c) => Some(c.as_u64()),
            _ => None,
        }
    }

    fn is_const_value(&self, v: u64) -> bool {
        self.as_const() == Some(v)
    }

    /// Apply a unary operator, folding constants.
    pub fn unop(op: UnOp, arg: Self) -> Self {
        if let Some(v) = arg.as_const() {
            return Self::Const(Const::of(op.result_type(), op.eval(v)));
        }
        match (op, &arg) {
            (
                UnOp::Not1,
                Self::Unop {
                    op: UnOp::Not1,
                    arg: inner,
                },
            )
            | (
                UnOp::Not32,
                Self::Unop {
                    op: UnOp::Not32,
                    arg: inner,
                },
            ) => return (**inner).clone(),
            _ => {}
        }
        Self::Unop {
            op,
            arg: Box::new(arg),
        }
    }

    /// Apply a binary operator, folding constants and trivial identities.
    pub fn binop(op: BinOp, left: Self, right: Self) -> Self {
        if let (Some(a), Some(b)) = (left.as_const(), right.as_const()) {
            return Self::Const(Const::of(op.result_type(), op.eval(a, b)));
        }
        match op {
            BinOp::Add32 | BinOp::Or32 | BinOp::Xor32 => {
                if right.is_const_value(0) {
                    return left;
                }
                if left.is_const_value(0) {
                    return right;
                }
            }
            BinOp::Sub32 | BinOp::Shl32 | BinOp::Shr32 | BinOp::Sar32 => {
                if right.is_const_value(0) {
                    return left;
                }
            }
            BinOp::And32 => {
                if right.is_const_value(0xffff_ffff) {
                    return left;
                }
                if left.is_const_value(0xffff_ffff) {
                    return right;
                }
                if right.is_const_value(0) || left.is_const_value(0) {
                    return Self::u32(0);
                }
            }
            BinOp::And1 => {
                if right.is_const_value(1) {
                    return left;
                }
                if left.is_const_value(1) {
                    return right;
                }
                if right.is_const_value(0) || left.is_const_value(0) {
                    return Self::u1(false);
                }
            }
            BinOp::Or1 => {
                if right.is_const_value(0) {
                    return left;
                }
                if left.is_const_value(0) {
                    return right;
                }
                if right.is_const_value(1) || left.is_const_value(1) {
                    return Self::u1(true);
                }
            }
            _ => {}
        }
        Self::Binop {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// If-then-else on an `I1` condition.
    pub fn ite(cond: Self, iftrue: Self, iffalse: Self) -> Self {
        match cond.as_const() {
            Some(0) => return iffalse,
            Some(_) => return iftrue,
            None => {}
        }
        if iftrue == iffalse {
            return iftrue;
        }
        Self::Ite {
            cond: Box::new(cond),
            iftrue: Box::new(iftrue),
            iffalse: Box::new(iffalse),
        }
    }

    pub fn add32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::Add32, left, right)
    }

    pub fn sub32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::Sub32, left, right)
    }

    pub fn mul32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::Mul32, left, right)
    }

    pub fn and32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::And32, left, right)
    }

    pub fn or32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::Or32, left, right)
    }

    pub fn xor32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::Xor32, left, right)
    }

    pub fn not32(arg: Self) -> Self {
        Self::unop(UnOp::Not32, arg)
    }

    /// Shift left by a constant amount (0..=31).
    pub fn shl32(left: Self, amount: u8) -> Self {
        Self::binop(BinOp::Shl32, left, Self::u8(amount))
    }

    /// Logical shift right by a constant amount (0..=31).
    pub fn shr32(left: Self, amount: u8) -> Self {
        Self::binop(BinOp::Shr32, left, Self::u8(amount))
    }

    /// Arithmetic shift right by a constant amount (0..=31).
    pub fn sar32(left: Self, amount: u8) -> Self {
        Self::binop(BinOp::Sar32, left, Self::u8(amount))
    }

    pub fn cmp_eq32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::CmpEq32, left, right)
    }

    pub fn cmp_ne32(left: Self, right: Self) -> Self {
        Self::binop(BinOp::CmpNe32, left, right)
    }

    pub fn cmp_lt32u(left: Self, right: Self) -> Self {
        Self::binop(BinOp::CmpLtU32, left, right)
    }

    pub fn cmp_le32u(left: Self, right: Self) -> Self {
        Self::binop(BinOp::CmpLeU32, left, right)
    }

    pub fn cmp_lt32s(left: Self, right: Self) -> Self {
        Self::binop(BinOp::CmpLtS32, left, right)
    }

    pub fn cmp_le32s(left: Self, right: Self) -> Self {
        Self::binop(BinOp::CmpLeS32, left, right)
    }

    pub fn not1(arg: Self) -> Self {
        Self::unop(UnOp::Not1, arg)
    }

    pub fn and1(left: Self, right: Self) -> Self {
        Self::binop(BinOp::And1, left, right)
    }

    pub fn or1(left: Self, right: Self) -> Self {
        Self::binop(BinOp::Or1, left, right)
    }

    /// Low bit of a 32-bit value as `I1`.
    pub fn to1(arg: Self) -> Self {
        Self::unop(UnOp::Trunc32To1, arg)
    }

    /// `I1` widened to 0 or 1.
    pub fn from1(arg: Self) -> Self {
        Self::unop(UnOp::Zext1To32, arg)
    }

    pub fn to8(arg: Self) -> Self {
        Self::unop(UnOp::Trunc32To8, arg)
    }

    pub fn to16(arg: Self) -> Self {
        Self::unop(UnOp::Trunc32To16, arg)
    }

    /// Low half of a 64-bit value.
    pub fn lo32(arg: Self) -> Self {
        Self::unop(UnOp::Trunc64To32, arg)
    }

    /// High half of a 64-bit value.
    pub fn hi32(arg: Self) -> Self {
        Self::unop(UnOp::High64To32, arg)
    }

    pub fn hl64(hi: Self, lo: Self) -> Self {
        Self::binop(BinOp::Hl32To64, hi, lo)
    }

    /// Rotate right by a constant amount.
    pub fn ror32(arg: Self, amount: u8) -> Self {
        let amount = amount & 31;
        if amount == 0 {
            return arg;
        }
        Self::or32(
            Self::shr32(arg.clone(), amount),
            Self::shl32(arg, 32 - amount),
        )
    }

    /// Bit `n` of a 32-bit value, as 0 or 1.
    pub fn bit32(arg: Self, n: u8) -> Self {
        Self::and32(Self::shr32(arg, n), Self::u32(1))
    }

    /// Result type, checking operand types along the way.
    ///
    /// `temps` maps temporaries to their declared types.
    ///
    /// # Panics
    ///
    /// Panics on an ill-typed tree; that is a lifter bug.
    pub fn ty(&self, temps: &[IrType]) -> IrType {
        match self {
            Self::Const(c) => c.ty(),
            Self::Get { ty, .. } | Self::Load { ty, .. } => *ty,
            Self::RdTmp(t) => temps[t.index()],
            Self::Unop { op, arg } => {
                let (want, out) = op.signature();
                let got = arg.ty(temps);
                assert_eq!(got, want, "operand of {} has type {got:?}", op.name());
                out
            }
            Self::Binop { op, left, right } => {
                let (l, r, out) = op.signature();
                let (gl, gr) = (left.ty(temps), right.ty(temps));
                assert!(
                    gl == l && gr == r,
                    "operands of {} have types {gl:?}, {gr:?}",
                    op.name()
                );
                out
            }
            Self::Ite {
                cond,
                iftrue,
                iffalse,
            } => {
                assert_eq!(cond.ty(temps), IrType::I1, "ITE condition must be I1");
                let t = iftrue.ty(temps);
                assert_eq!(t, iffalse.ty(temps), "ITE arms differ in type");
                t
            }
            Self::CCall { ret_ty, args, .. } => {
                for arg in args {
                    arg.ty(temps);
                }
                *ret_ty
            }
        }
    }

    /// Visit every temporary read by this expression.
    pub fn for_each_tmp(&self, f: &mut impl FnMut(Temp)) {
        match self {
            Self::Const(_) | Self::Get { .. } => {}
            Self::RdTmp(t) => f(*t),
            Self::Unop { arg, .. } | Self::Load { addr: arg, .. } => arg.for_each_tmp(f),
            Self::Binop { left, right, .. } => {
                left.for_each_tmp(f);
                right.for_each_tmp(f);
            }
            Self::Ite {
                cond,
                iftrue,
                iffalse,
            } => {
                cond.for_each_tmp(f);
                iftrue.for_each_tmp(f);
                iffalse.for_each_tmp(f);
            }
            Self::CCall { args, .. } => {
                for arg in args {
                    arg.for_each_tmp(f);
                }
            }
        }
    }

    /// Rebuild bottom-up through the folding factories, offering each
    /// rebuilt node to `f`.
    #[must_use]
    pub fn rewrite(self, f: &mut impl FnMut(Self) -> Self) -> Self {
        let rebuilt = match self {
            Self::Unop { op, arg } => Self::unop(op, arg.rewrite(f)),
            Self::Binop { op, left, right } => Self::binop(op, left.rewrite(f), right.rewrite(f)),
            Self::Ite {
                cond,
                iftrue,
                iffalse,
            } => Self::ite(cond.rewrite(f), iftrue.rewrite(f), iffalse.rewrite(f)),
            Self::Load { ty, addr } => Self::load(ty, addr.rewrite(f)),
            Self::CCall {
                callee,
                ret_ty,
                args,
            } => Self::ccall(
                callee,
                ret_ty,
                args.into_iter().map(|a| a.rewrite(f)).collect(),
            ),
            leaf => leaf,
        };
        f(rebuilt)
    }
}
