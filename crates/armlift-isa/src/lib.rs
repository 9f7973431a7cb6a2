//! ARM32 instruction decoder and lifter.
//!
//! This crate turns A32, T16 and T32 machine code into `armlift-ir` blocks,
//! one instruction per [`Lifter::lift_one`] call. Condition flags are kept
//! lazily as a thunk (see [`flags`]); conditional execution is expressed
//! with guards rather than control flow (see [`guard`]). Instruction
//! families plug into a [`FamilyChain`] per encoding space.

mod bits;
mod config;
mod context;
mod dispatch;
pub mod families;
pub mod flags;
pub mod guard;
mod it_state;
pub mod layout;
mod regs;
mod result;
pub mod shifter;
pub mod special;
mod types;

pub use config::{ArchInfo, HwCaps, ItMode, LiftOptions};
pub use context::DecodeContext;
pub use dispatch::{LiftRequest, Lifter, is_t32_prefix, lift_one};
pub use families::{Encoding, FamilyChain, InstructionFamily, Outcome};
pub use flags::FlagHelpers;
pub use guard::Guard;
pub use it_state::ItState;
pub use result::{DecodeResult, DecodeStatus, NextAction};
pub use types::{Cond, InstrSet, REG_LR, REG_PC, REG_SP, ShiftKind, reg_name};

use armlift_ir::IrBlock;

/// Block-local cleanup: forward guest-state writes to later reads, fold
/// flag helper calls whose thunk is known, drop unused temporaries.
pub fn optimize(block: &mut IrBlock) {
    armlift_ir::forward_puts(block);
    armlift_ir::rewrite_ccalls(block, flags::fold_helper);
    armlift_ir::forward_puts(block);
    armlift_ir::remove_dead_temps(block);
}
