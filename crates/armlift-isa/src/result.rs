//! Per-call decode result.

use armlift_ir::JumpKind;

/// Whether the instruction was understood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStatus {
    Ok,
    Failed,
}

/// What the block driver should do after this instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextAction {
    /// Lift the next sequential instruction.
    Continue,
    /// Lift at `continue_at` next, unconditionally reached.
    ResteerU,
    /// Lift at `continue_at` next, on a speculated branch direction; a side
    /// exit covers the other direction.
    ResteerC,
    /// The block ends here; the PC slot holds the destination.
    StopHere,
}

/// Outcome of lifting one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeResult {
    /// Bytes consumed: 2, 4 or 20, or 0 on failure.
    pub len: u32,
    pub status: DecodeStatus,
    pub next: NextAction,
    /// Jump kind of the block end when `next` is `StopHere`.
    pub jk_stop: Option<JumpKind>,
    /// Resteer target (Thumb bit included) for the resteer actions.
    pub continue_at: Option<u32>,
}

impl DecodeResult {
    pub const fn continue_(len: u32) -> Self {
        Self {
            len,
            status: DecodeStatus::Ok,
            next: NextAction::Continue,
            jk_stop: None,
            continue_at: None,
        }
    }

    pub const fn stop(len: u32, jk: JumpKind) -> Self {
        Self {
            len,
            status: DecodeStatus::Ok,
            next: NextAction::StopHere,
            jk_stop: Some(jk),
            continue_at: None,
        }
    }

    pub const fn resteer(len: u32, target: u32, conditional: bool) -> Self {
        Self {
            len,
            status: DecodeStatus::Ok,
            next: if conditional {
                NextAction::ResteerC
            } else {
                NextAction::ResteerU
            },
            jk_stop: None,
            continue_at: Some(target),
        }
    }

    pub const fn failed() -> Self {
        Self {
            len: 0,
            status: DecodeStatus::Failed,
            next: NextAction::StopHere,
            jk_stop: Some(JumpKind::NoDecode),
            continue_at: None,
        }
    }

    pub const fn is_ok(&self) -> bool {
        matches!(self.status, DecodeStatus::Ok)
    }
}
