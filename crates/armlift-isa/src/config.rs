//! Lifter configuration.

use bitflags::bitflags;

use crate::it_state::ItState;

bitflags! {
    /// Optional hardware features of the guest CPU.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HwCaps: u32 {
        /// VFPv2 floating point.
        const VFP  = 1 << 0;
        /// VFPv3 (32 double registers).
        const VFP3 = 1 << 1;
        /// Advanced SIMD.
        const NEON = 1 << 2;
    }
}

/// Guest architecture description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchInfo {
    /// Architecture version (5, 6 or 7).
    pub arch_version: u8,
    pub hwcaps: HwCaps,
}

impl Default for ArchInfo {
    fn default() -> Self {
        Self {
            arch_version: 7,
            hwcaps: HwCaps::VFP | HwCaps::VFP3 | HwCaps::NEON,
        }
    }
}

impl ArchInfo {
    pub const fn new(arch_version: u8, hwcaps: HwCaps) -> Self {
        Self {
            arch_version,
            hwcaps,
        }
    }

    /// MOVW/MOVT, MLS, and the wide Thumb encodings.
    pub const fn has_v6t2(&self) -> bool {
        self.arch_version >= 7
    }

    /// BLX, CLZ and the saturating arithmetic group.
    pub const fn has_v5te(&self) -> bool {
        self.arch_version >= 5
    }

    /// SXT*/UXT*/REV* extension instructions.
    pub const fn has_v6(&self) -> bool {
        self.arch_version >= 6
    }
}

/// How the lifter learns the IT state of a Thumb instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ItMode {
    /// Read and update the ITSTATE guest slot at run time.
    #[default]
    Dynamic,
    /// The state is known at lift time; no IT bookkeeping IR is emitted.
    Known(ItState),
}

/// Per-lifter options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiftOptions {
    /// Allow speculative translation past conditional branches.
    pub chase_cond: bool,
    /// Block driver limit on guest instructions per block.
    pub max_insns_per_block: usize,
    /// Skip IT bookkeeping when no preceding halfword can be an IT.
    pub it_lookback: bool,
    /// Run the block-local cleanup passes after lifting.
    pub optimize: bool,
}

impl Default for LiftOptions {
    fn default() -> Self {
        Self {
            chase_cond: false,
            max_insns_per_block: 50,
            it_lookback: true,
            optimize: true,
        }
    }
}

impl LiftOptions {
    /// Set conditional branch chasing.
    #[must_use]
    pub const fn with_chase_cond(mut self, enabled: bool) -> Self {
        self.chase_cond = enabled;
        self
    }

    /// Set the per-block instruction limit.
    #[must_use]
    pub const fn with_max_insns(mut self, max: usize) -> Self {
        self.max_insns_per_block = max;
        self
    }

    /// Set the IT lookback fast path.
    #[must_use]
    pub const fn with_it_lookback(mut self, enabled: bool) -> Self {
        self.it_lookback = enabled;
        self
    }

    /// Set the cleanup passes.
    #[must_use]
    pub const fn with_optimize(mut self, enabled: bool) -> Self {
        self.optimize = enabled;
        self
    }
}
