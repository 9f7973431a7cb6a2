//! Shared helpers for the integration tests.

#![allow(dead_code)]

use armlift::{ArchInfo, ExitInfo, LiftOptions, LiftedBlock, Machine, lift_block};

/// Code is placed here unless a test says otherwise.
pub const BASE: u32 = 0x1000;

pub fn a32(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

pub fn thumb(halfwords: &[u16]) -> Vec<u8> {
    halfwords.iter().flat_map(|h| h.to_le_bytes()).collect()
}

/// Lift a block at `pc` from `code` mapped at [`BASE`].
pub fn lift(code: &[u8], pc: u32, opts: &LiftOptions) -> LiftedBlock {
    lift_block(code, BASE, pc, &ArchInfo::default(), opts).expect("block lifts")
}

/// Lift and execute a block with the given initial registers and NZCV.
pub fn run(
    code: &[u8],
    pc: u32,
    opts: &LiftOptions,
    regs: &[(u8, u32)],
    nzcv: u32,
) -> (Machine, ExitInfo, LiftedBlock) {
    let lifted = lift(code, pc, opts);
    let mut m = Machine::new().with_code(code, BASE);
    for &(r, v) in regs {
        m.set_reg(r, v).unwrap();
    }
    m.set_nzcv(nzcv).unwrap();
    let exit = m.run(&lifted).expect("block runs");
    (m, exit, lifted)
}
