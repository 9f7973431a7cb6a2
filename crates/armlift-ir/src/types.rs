//! Value types, constants and temporaries.

/// IR value type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IrType {
    I1,
    I8,
    I16,
    I32,
    I64,
}

impl IrType {
    /// Width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Self::I1 => 1,
            Self::I8 => 8,
            Self::I16 => 16,
            Self::I32 => 32,
            Self::I64 => 64,
        }
    }

    /// Size in bytes when stored to guest state or memory.
    pub const fn bytes(self) -> usize {
        match self {
            Self::I1 | Self::I8 => 1,
            Self::I16 => 2,
            Self::I32 => 4,
            Self::I64 => 8,
        }
    }

    /// Mask selecting the valid bits of a value of this type.
    pub const fn mask(self) -> u64 {
        match self {
            Self::I64 => u64::MAX,
            _ => (1u64 << self.bits()) - 1,
        }
    }
}

/// Typed constant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Const {
    U1(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl Const {
    /// Build a constant of the given type, truncating `value`.
    pub const fn of(ty: IrType, value: u64) -> Self {
        match ty {
            IrType::I1 => Self::U1(value & 1 != 0),
            IrType::I8 => Self::U8(value as u8),
            IrType::I16 => Self::U16(value as u16),
            IrType::I32 => Self::U32(value as u32),
            IrType::I64 => Self::U64(value),
        }
    }

    pub const fn ty(self) -> IrType {
        match self {
            Self::U1(_) => IrType::I1,
            Self::U8(_) => IrType::I8,
            Self::U16(_) => IrType::I16,
            Self::U32(_) => IrType::I32,
            Self::U64(_) => IrType::I64,
        }
    }

    /// Zero-extended value.
    pub const fn as_u64(self) -> u64 {
        match self {
            Self::U1(b) => b as u64,
            Self::U8(v) => v as u64,
            Self::U16(v) => v as u64,
            Self::U32(v) => v as u64,
            Self::U64(v) => v,
        }
    }
}

/// Block-local temporary, assigned exactly once.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Temp(pub(crate) u32);

impl Temp {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_truncates() {
        assert_eq!(Const::of(IrType::I8, 0x1ff), Const::U8(0xff));
        assert_eq!(Const::of(IrType::I1, 2), Const::U1(false));
        assert_eq!(Const::of(IrType::I32, 0x1_0000_0005).as_u64(), 5);
    }

    #[test]
    fn test_type_mask() {
        assert_eq!(IrType::I1.mask(), 1);
        assert_eq!(IrType::I32.mask(), 0xffff_ffff);
        assert_eq!(IrType::I64.mask(), u64::MAX);
    }
}
