//! Basic-block driver.
//!
//! Calls [`Lifter::lift_one`] until an instruction ends the block, the
//! per-block instruction limit is reached, or the code buffer runs out.
//! Branches into the buffer are followed when the lifter resteers.

use armlift_ir::{Expr, IrBlock, JumpKind};
use armlift_isa::layout::OFFB_R15T;
use armlift_isa::{ArchInfo, DecodeResult, LiftOptions, LiftRequest, Lifter, NextAction};
use tracing::debug;

use crate::error::{Error, Result};

/// Why the driver stopped adding instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockEnd {
    /// The last instruction ended the block.
    Stop,
    /// `max_insns_per_block` instructions were lifted.
    Limit,
    /// The next instruction lies outside the code buffer.
    EndOfBuffer,
    /// An instruction after the first could not be decoded.
    DecodeFailure,
}

/// A lifted block and how it came about.
#[derive(Debug)]
pub struct LiftedBlock {
    pub block: IrBlock,
    /// Guest instructions lifted, special sequences counting as one.
    pub insns: usize,
    /// Address (Thumb bit included) of each lifted instruction, in order.
    pub pcs: Vec<u32>,
    pub end: BlockEnd,
    /// Result of the last `lift_one` call.
    pub last: DecodeResult,
}

impl LiftedBlock {
    pub const fn jumpkind(&self) -> JumpKind {
        self.block.jumpkind()
    }
}

/// Code buffer mapped at a guest address.
#[derive(Clone, Copy)]
struct CodeView<'a> {
    code: &'a [u8],
    base: u32,
}

impl CodeView<'_> {
    /// Buffer offset of `pc` (Thumb bit ignored), if it is inside.
    fn offset_of(&self, pc: u32) -> Option<usize> {
        let off = (pc & !1).checked_sub(self.base)? as usize;
        (off < self.code.len()).then_some(off)
    }
}

/// Lift one block with the standard instruction families.
pub fn lift_block(
    code: &[u8],
    base_addr: u32,
    guest_pc: u32,
    arch: &ArchInfo,
    opts: &LiftOptions,
) -> Result<LiftedBlock> {
    let lifter = Lifter::new(*arch, *opts);
    lift_block_with(&lifter, code, base_addr, guest_pc)
}

/// Lift one block starting at `guest_pc` (bit 0 selects Thumb), where
/// `code[0]` lives at `base_addr`.
pub fn lift_block_with(
    lifter: &Lifter,
    code: &[u8],
    base_addr: u32,
    guest_pc: u32,
) -> Result<LiftedBlock> {
    let view = CodeView {
        code,
        base: base_addr,
    };
    let resteer_ok = |target: u32| view.offset_of(target).is_some();
    let max_insns = lifter.options().max_insns_per_block.max(1);

    let mut irsb = IrBlock::new();
    let mut pcs = Vec::new();
    let mut pc = guest_pc;
    let mut pc_pending = false;
    let mut last = None;

    let end = loop {
        let Some(delta) = view.offset_of(pc) else {
            if pcs.is_empty() {
                return Err(Error::OutOfBuffer { pc });
            }
            break BlockEnd::EndOfBuffer;
        };
        if pcs.len() >= max_insns {
            break BlockEnd::Limit;
        }

        let req = LiftRequest::new(code, delta, pc).with_resteer(&resteer_ok);
        let res = lifter.lift_one(&mut irsb, &req);
        last = Some(res);
        if !res.is_ok() {
            if pcs.is_empty() {
                return Err(Error::Decode { pc });
            }
            debug!(pc = format!("{:#x}", pc), "block ends at undecodable instruction");
            break BlockEnd::DecodeFailure;
        }
        pcs.push(pc);

        let tag = pc & 1;
        match res.next {
            NextAction::Continue => {
                pc = (pc & !1).wrapping_add(res.len) | tag;
                pc_pending = false;
            }
            NextAction::ResteerU | NextAction::ResteerC => {
                let Some(target) = res.continue_at else {
                    panic!("resteer without a target at {pc:#x}");
                };
                debug!(
                    from = format!("{:#x}", pc),
                    to = format!("{:#x}", target),
                    conditional = res.next == NextAction::ResteerC,
                    "resteer"
                );
                pc = target;
                pc_pending = true;
            }
            NextAction::StopHere => break BlockEnd::Stop,
        }
    };
    let Some(last) = last else {
        unreachable!("a block lifts at least one instruction");
    };

    // a resteer leaves the PC slot stale until its target is lifted
    if pc_pending && matches!(end, BlockEnd::EndOfBuffer | BlockEnd::Limit) {
        irsb.put(OFFB_R15T, Expr::u32(pc));
    }
    let jk = match end {
        BlockEnd::Stop | BlockEnd::DecodeFailure => last.jk_stop.unwrap_or_default(),
        BlockEnd::Limit | BlockEnd::EndOfBuffer => JumpKind::Boring,
    };
    irsb.set_next(Expr::get32(OFFB_R15T), jk);
    if lifter.options().optimize {
        armlift_isa::optimize(&mut irsb);
    }

    debug!(
        pc = format!("{:#x}", guest_pc),
        insns = pcs.len(),
        ?end,
        %jk,
        "lifted block"
    );
    Ok(LiftedBlock {
        block: irsb,
        insns: pcs.len(),
        pcs,
        end,
        last,
    })
}
