//! Control-transfer kinds.

/// Why control leaves a block (or a side exit is taken).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum JumpKind {
    /// Plain jump or fall-through.
    #[default]
    Boring,
    /// Procedure call; the return address is already in LR.
    Call,
    /// Procedure return.
    Ret,
    /// Client request preamble recognized.
    ClientReq,
    /// Branch to the non-redirected target of a wrapped function.
    NoRedir,
    /// System call; PC holds the following instruction.
    Syscall,
    /// Instruction could not be decoded; PC holds its address.
    NoDecode,
    /// Illegal instruction.
    SigIll,
    /// Breakpoint trap.
    SigTrap,
    /// Cached translations in `[CMSTART, CMSTART+CMLEN)` must be discarded.
    InvalICache,
    /// Hint that the guest is spinning.
    Yield,
}

impl JumpKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boring => "Boring",
            Self::Call => "Call",
            Self::Ret => "Ret",
            Self::ClientReq => "ClientReq",
            Self::NoRedir => "NoRedir",
            Self::Syscall => "Sys_syscall",
            Self::NoDecode => "NoDecode",
            Self::SigIll => "SigILL",
            Self::SigTrap => "SigTRAP",
            Self::InvalICache => "InvalICache",
            Self::Yield => "Yield",
        }
    }

    /// Check if this exit returns control to the dispatcher for a reason
    /// other than ordinary control flow.
    pub const fn is_special(self) -> bool {
        !matches!(self, Self::Boring | Self::Call | Self::Ret)
    }
}
