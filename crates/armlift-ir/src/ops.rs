//! Primitive operators and their evaluation.
//!
//! Each operator has a fixed signature. `eval` is the single source of truth
//! for operator semantics: it is shared by constant folding and by the
//! interpreter, so folded and executed code always agree.

use crate::types::IrType;

/// Unary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UnOp {
    Not1,
    Not32,
    /// Count leading zeros; 32 for a zero input.
    Clz32,
    Zext1To32,
    Zext8To32,
    Sext8To32,
    Zext16To32,
    Sext16To32,
    Zext32To64,
    Sext32To64,
    Trunc32To1,
    Trunc32To8,
    Trunc32To16,
    Trunc64To32,
    High64To32,
}

impl UnOp {
    /// Operand and result types.
    pub const fn signature(self) -> (IrType, IrType) {
        use IrType::*;
        match self {
            Self::Not1 => (I1, I1),
            Self::Not32 | Self::Clz32 => (I32, I32),
            Self::Zext1To32 => (I1, I32),
            Self::Zext8To32 | Self::Sext8To32 => (I8, I32),
            Self::Zext16To32 | Self::Sext16To32 => (I16, I32),
            Self::Zext32To64 | Self::Sext32To64 => (I32, I64),
            Self::Trunc32To1 => (I32, I1),
            Self::Trunc32To8 => (I32, I8),
            Self::Trunc32To16 => (I32, I16),
            Self::Trunc64To32 | Self::High64To32 => (I64, I32),
        }
    }

    pub const fn result_type(self) -> IrType {
        self.signature().1
    }

    /// Evaluate on a zero-extended operand; the result is zero-extended.
    pub const fn eval(self, x: u64) -> u64 {
        let v = match self {
            Self::Not1 => x ^ 1,
            Self::Not32 => !x,
            Self::Clz32 => (x as u32).leading_zeros() as u64,
            Self::Zext1To32
            | Self::Zext8To32
            | Self::Zext16To32
            | Self::Zext32To64
            | Self::Trunc32To1
            | Self::Trunc32To8
            | Self::Trunc32To16
            | Self::Trunc64To32 => x,
            Self::Sext8To32 => x as u8 as i8 as i32 as u32 as u64,
            Self::Sext16To32 => x as u16 as i16 as i32 as u32 as u64,
            Self::Sext32To64 => x as u32 as i32 as i64 as u64,
            Self::High64To32 => x >> 32,
        };
        v & self.result_type().mask()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Not1 => "Not1",
            Self::Not32 => "Not32",
            Self::Clz32 => "Clz32",
            Self::Zext1To32 => "1Uto32",
            Self::Zext8To32 => "8Uto32",
            Self::Sext8To32 => "8Sto32",
            Self::Zext16To32 => "16Uto32",
            Self::Sext16To32 => "16Sto32",
            Self::Zext32To64 => "32Uto64",
            Self::Sext32To64 => "32Sto64",
            Self::Trunc32To1 => "32to1",
            Self::Trunc32To8 => "32to8",
            Self::Trunc32To16 => "32to16",
            Self::Trunc64To32 => "64to32",
            Self::High64To32 => "64HIto32",
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinOp {
    Add32,
    Sub32,
    Mul32,
    /// Unsigned 32x32 -> 64 multiply.
    MullU32,
    /// Signed 32x32 -> 64 multiply.
    MullS32,
    And32,
    Or32,
    Xor32,
    /// Shifts take an `I8` amount; amounts of 32 or more shift everything out.
    Shl32,
    Shr32,
    Sar32,
    CmpEq32,
    CmpNe32,
    CmpLtU32,
    CmpLeU32,
    CmpLtS32,
    CmpLeS32,
    And1,
    Or1,
    Add64,
    /// High half in the left operand.
    Hl32To64,
    /// Signed saturating add.
    QAdd32S,
    /// Signed saturating subtract.
    QSub32S,
}

impl BinOp {
    /// Left operand, right operand and result types.
    pub const fn signature(self) -> (IrType, IrType, IrType) {
        use IrType::*;
        match self {
            Self::Add32
            | Self::Sub32
            | Self::Mul32
            | Self::And32
            | Self::Or32
            | Self::Xor32
            | Self::QAdd32S
            | Self::QSub32S => (I32, I32, I32),
            Self::MullU32 | Self::MullS32 | Self::Hl32To64 => (I32, I32, I64),
            Self::Shl32 | Self::Shr32 | Self::Sar32 => (I32, I8, I32),
            Self::CmpEq32
            | Self::CmpNe32
            | Self::CmpLtU32
            | Self::CmpLeU32
            | Self::CmpLtS32
            | Self::CmpLeS32 => (I32, I32, I1),
            Self::And1 | Self::Or1 => (I1, I1, I1),
            Self::Add64 => (I64, I64, I64),
        }
    }

    pub const fn result_type(self) -> IrType {
        self.signature().2
    }

    /// Evaluate on zero-extended operands; the result is zero-extended.
    pub const fn eval(self, a: u64, b: u64) -> u64 {
        let (a32, b32) = (a as u32, b as u32);
        let v = match self {
            Self::Add32 => a32.wrapping_add(b32) as u64,
            Self::Sub32 => a32.wrapping_sub(b32) as u64,
            Self::Mul32 => a32.wrapping_mul(b32) as u64,
            Self::MullU32 => a32 as u64 * b32 as u64,
            Self::MullS32 => (a32 as i32 as i64).wrapping_mul(b32 as i32 as i64) as u64,
            Self::And32 | Self::And1 => a & b,
            Self::Or32 | Self::Or1 => a | b,
            Self::Xor32 => a ^ b,
            Self::Shl32 => {
                if b >= 32 {
                    0
                } else {
                    (a32 << b as u32) as u64
                }
            }
            Self::Shr32 => {
                if b >= 32 {
                    0
                } else {
                    (a32 >> b as u32) as u64
                }
            }
            Self::Sar32 => {
                let s = if b >= 32 { 31 } else { b as u32 };
                ((a32 as i32) >> s) as u32 as u64
            }
            Self::CmpEq32 => (a32 == b32) as u64,
            Self::CmpNe32 => (a32 != b32) as u64,
            Self::CmpLtU32 => (a32 < b32) as u64,
            Self::CmpLeU32 => (a32 <= b32) as u64,
            Self::CmpLtS32 => ((a32 as i32) < (b32 as i32)) as u64,
            Self::CmpLeS32 => ((a32 as i32) <= (b32 as i32)) as u64,
            Self::Add64 => a.wrapping_add(b),
            Self::Hl32To64 => ((a32 as u64) << 32) | b32 as u64,
            Self::QAdd32S => (a32 as i32).saturating_add(b32 as i32) as u32 as u64,
            Self::QSub32S => (a32 as i32).saturating_sub(b32 as i32) as u32 as u64,
        };
        v & self.result_type().mask()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Add32 => "Add32",
            Self::Sub32 => "Sub32",
            Self::Mul32 => "Mul32",
            Self::MullU32 => "MullU32",
            Self::MullS32 => "MullS32",
            Self::And32 => "And32",
            Self::Or32 => "Or32",
            Self::Xor32 => "Xor32",
            Self::Shl32 => "Shl32",
            Self::Shr32 => "Shr32",
            Self::Sar32 => "Sar32",
            Self::CmpEq32 => "CmpEQ32",
            Self::CmpNe32 => "CmpNE32",
            Self::CmpLtU32 => "CmpLT32U",
            Self::CmpLeU32 => "CmpLE32U",
            Self::CmpLtS32 => "CmpLT32S",
            Self::CmpLeS32 => "CmpLE32S",
            Self::And1 => "And1",
            Self::Or1 => "Or1",
            Self::Add64 => "Add64",
            Self::Hl32To64 => "32HLto64",
            Self::QAdd32S => "QAdd32S",
            Self::QSub32S => "QSub32S",
        }
    }
}
