//! ARM32 lifter.
//!
//! Decodes A32, T16 and T32 machine code into `armlift-ir` blocks.
//!
//! # Example
//!
//! ```ignore
//! use armlift::{ArchInfo, LiftOptions, lift_block};
//!
//! // adds r1, r2, r3 ; mov pc, lr
//! let code = [0x03, 0x10, 0x92, 0xe0, 0x0e, 0xf0, 0xa0, 0xe1];
//! let lifted = lift_block(&code, 0x1000, 0x1000, &ArchInfo::default(), &LiftOptions::default())?;
//! println!("{}", lifted.block);
//! ```

mod block;
mod error;
mod exec;
mod input;

pub use armlift_ir::{ExitInfo, Expr, IrBlock, JumpKind};
pub use armlift_isa::{
    ArchInfo, DecodeResult, DecodeStatus, Encoding, HwCaps, InstrSet, ItMode, LiftOptions,
    LiftRequest, Lifter, NextAction, reg_name,
};
pub use block::{BlockEnd, LiftedBlock, lift_block, lift_block_with};
pub use error::{Error, Result};
pub use exec::{Machine, parse_reg_assignment};
pub use input::{parse_hex_code, read_code_file};
