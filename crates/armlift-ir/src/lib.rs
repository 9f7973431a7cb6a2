//! Intermediate representation for the ARM32 lifter.
//!
//! This crate provides pure IR types with no ARM-specific knowledge:
//! typed expressions, statements, single-entry multi-exit blocks and a
//! reference interpreter. The ARM lifting is implemented in `armlift-isa`.

mod block;
mod display;
mod expr;
mod interp;
mod jump;
mod ops;
mod opt;
mod stmt;
mod types;

pub use block::*;
pub use expr::*;
pub use interp::*;
pub use jump::*;
pub use ops::*;
pub use opt::*;
pub use stmt::*;
pub use types::*;
