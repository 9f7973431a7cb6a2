//! Thumb instruction families.
//!
//! 16-bit families see the halfword in the low 16 bits of `insn`; 32-bit
//! families see the first halfword in bits 31:16 and the second in 15:0.

mod t16_alu;
mod t16_control;
mod t16_memory;
mod t32_alu;
mod t32_control;
mod t32_memory;

pub use t16_alu::T16Alu;
pub use t16_control::T16Control;
pub use t16_memory::T16Memory;
pub use t32_alu::T32Alu;
pub use t32_control::T32Control;
pub use t32_memory::T32Memory;

use crate::types::{REG_PC, REG_SP};

/// SP or PC, which most wide encodings reject as operands.
const fn is_bad_reg(r: u8) -> bool {
    r == REG_SP || r == REG_PC
}
