//! Core ARM types: condition codes, shift kinds, instruction sets.

use std::fmt;

/// Stack pointer.
pub const REG_SP: u8 = 13;
/// Link register.
pub const REG_LR: u8 = 14;
/// Program counter.
pub const REG_PC: u8 = 15;

/// Instruction set the PC is executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrSet {
    A32,
    Thumb,
}

impl InstrSet {
    /// Instruction set selected by bit 0 of a guest PC.
    pub const fn from_pc(pc: u32) -> Self {
        if pc & 1 == 0 { Self::A32 } else { Self::Thumb }
    }

    /// Offset added to the instruction address when PC is read as an operand.
    pub const fn pc_read_offset(self) -> u32 {
        match self {
            Self::A32 => 8,
            Self::Thumb => 4,
        }
    }

    /// Bit 0 of a PC value in this instruction set.
    pub const fn pc_tag(self) -> u32 {
        match self {
            Self::A32 => 0,
            Self::Thumb => 1,
        }
    }
}

/// Condition code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cond {
    Eq = 0,
    Ne = 1,
    Hs = 2,
    Lo = 3,
    Mi = 4,
    Pl = 5,
    Vs = 6,
    Vc = 7,
    Hi = 8,
    Ls = 9,
    Ge = 10,
    Lt = 11,
    Gt = 12,
    Le = 13,
    Al = 14,
    /// Encoding 0b1111: "always" in Thumb IT contexts, the unconditional
    /// space in A32.
    Nv = 15,
}

impl Cond {
    /// Decode a 4-bit condition field.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0xf {
            0 => Self::Eq,
            1 => Self::Ne,
            2 => Self::Hs,
            3 => Self::Lo,
            4 => Self::Mi,
            5 => Self::Pl,
            6 => Self::Vs,
            7 => Self::Vc,
            8 => Self::Hi,
            9 => Self::Ls,
            10 => Self::Ge,
            11 => Self::Lt,
            12 => Self::Gt,
            13 => Self::Le,
            14 => Self::Al,
            _ => Self::Nv,
        }
    }

    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// The opposite condition (flips bit 0).
    pub const fn invert(self) -> Self {
        Self::from_bits(self.bits() ^ 1)
    }

    pub const fn is_always(self) -> bool {
        matches!(self, Self::Al | Self::Nv)
    }

    /// Evaluate against packed NZCV (bits 3..0).
    pub const fn holds(self, nzcv: u32) -> bool {
        let n = nzcv & 8 != 0;
        let z = nzcv & 4 != 0;
        let c = nzcv & 2 != 0;
        let v = nzcv & 1 != 0;
        match self {
            Self::Eq => z,
            Self::Ne => !z,
            Self::Hs => c,
            Self::Lo => !c,
            Self::Mi => n,
            Self::Pl => !n,
            Self::Vs => v,
            Self::Vc => !v,
            Self::Hi => c && !z,
            Self::Ls => !c || z,
            Self::Ge => n == v,
            Self::Lt => n != v,
            Self::Gt => !z && n == v,
            Self::Le => z || n != v,
            Self::Al | Self::Nv => true,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Hs => "hs",
            Self::Lo => "lo",
            Self::Mi => "mi",
            Self::Pl => "pl",
            Self::Vs => "vs",
            Self::Vc => "vc",
            Self::Hi => "hi",
            Self::Ls => "ls",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Al => "al",
            Self::Nv => "nv",
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Barrel shifter operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl ShiftKind {
    /// Decode the 2-bit shift type field.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Lsl,
            1 => Self::Lsr,
            2 => Self::Asr,
            _ => Self::Ror,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Lsl => "lsl",
            Self::Lsr => "lsr",
            Self::Asr => "asr",
            Self::Ror => "ror",
        }
    }
}

/// Register name as used in disassembly.
pub const fn reg_name(r: u8) -> &'static str {
    const NAMES: [&str; 16] = [
        "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "sp",
        "lr", "pc",
    ];
    NAMES[(r & 15) as usize]
}
