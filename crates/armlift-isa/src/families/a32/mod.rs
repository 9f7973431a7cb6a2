//! A32 instruction families.
//!
//! Every family except [`A32Unconditional`] ignores words whose condition
//! field is `0b1111`; the dispatcher has already turned the condition into
//! the instruction guard.

mod branch;
mod data_processing;
mod extra_load_store;
mod load_store;
mod load_store_multiple;
mod misc;
mod multiply;
mod svc;
mod unconditional;

pub use branch::A32Branch;
pub use data_processing::A32DataProcessing;
pub use extra_load_store::A32ExtraLoadStore;
pub use load_store::A32LoadStore;
pub use load_store_multiple::A32LoadStoreMultiple;
pub use misc::A32Misc;
pub use multiply::A32Multiply;
pub use svc::A32Svc;
pub use unconditional::A32Unconditional;

/// Condition field is `0b1111`.
const fn is_unconditional(insn: u32) -> bool {
    insn >> 28 == 0xf
}
