//! Instruction families.
//!
//! Each family recognises one slice of an encoding space and lifts what it
//! recognises. The dispatcher tries the families of a [`FamilyChain`] in
//! order and the first one that claims the bits wins, so the chain order is
//! the decode priority. The standard chains only know a sliver of the
//! coprocessor spaces; VFP, the rest of Advanced SIMD and media plug in with
//! [`FamilyChain::with_family`].

pub(crate) mod alu;
pub(crate) mod control;
pub(crate) mod memory;

mod a32;
mod coproc;
mod thumb;

pub use a32::{
    A32Branch, A32DataProcessing, A32ExtraLoadStore, A32LoadStore, A32LoadStoreMultiple,
    A32Misc, A32Multiply, A32Svc, A32Unconditional,
};
pub use coproc::{A32Coproc, T32Coproc};
pub use thumb::{T16Alu, T16Control, T16Memory, T32Alu, T32Control, T32Memory};

use crate::config::HwCaps;
use crate::context::DecodeContext;

/// Result of offering an instruction to a family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Not this family's encoding; try the next one.
    NotMatched,
    /// Claimed and lifted.
    Lifted,
    /// Claimed, but the field combination is undefined or unpredictable.
    Undefined,
}

/// Encoding space a family decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 32-bit ARM instructions.
    A32,
    /// 16-bit Thumb instructions.
    T16,
    /// 32-bit Thumb instructions, first halfword in the upper 16 bits.
    T32,
}

/// One slice of an encoding space.
pub trait InstructionFamily: Send + Sync {
    /// Family name for tracing.
    fn name(&self) -> &'static str;

    /// Hardware features the family needs; it is skipped without them.
    fn required_caps(&self) -> HwCaps {
        HwCaps::empty()
    }

    /// Lift `insn` if it belongs to this family.
    ///
    /// A family returning [`Outcome::NotMatched`] must not have emitted
    /// anything the dispatcher cannot roll back.
    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome;
}

/// Ordered list of families for one encoding space.
pub struct FamilyChain {
    families: Vec<Box<dyn InstructionFamily>>,
}

impl FamilyChain {
    pub fn new(families: Vec<Box<dyn InstructionFamily>>) -> Self {
        Self { families }
    }

    /// Chain with no families.
    pub fn empty() -> Self {
        Self {
            families: Vec::new(),
        }
    }

    /// A32 families in decode priority order.
    pub fn a32() -> Self {
        Self::new(vec![
            Box::new(A32Unconditional),
            Box::new(A32Multiply),
            Box::new(A32Misc),
            Box::new(A32ExtraLoadStore),
            Box::new(A32DataProcessing),
            Box::new(A32LoadStore),
            Box::new(A32LoadStoreMultiple),
            Box::new(A32Branch),
            Box::new(A32Svc),
            Box::new(A32Coproc),
        ])
    }

    /// 16-bit Thumb families.
    pub fn thumb16() -> Self {
        Self::new(vec![
            Box::new(T16Alu),
            Box::new(T16Memory),
            Box::new(T16Control),
        ])
    }

    /// 32-bit Thumb families.
    pub fn thumb32() -> Self {
        Self::new(vec![
            Box::new(T32Control),
            Box::new(T32Alu),
            Box::new(T32Memory),
            Box::new(T32Coproc),
        ])
    }

    /// Append a family after the standard ones.
    #[must_use]
    pub fn with_family(mut self, family: impl InstructionFamily + 'static) -> Self {
        self.families.push(Box::new(family));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn InstructionFamily> {
        self.families.iter().map(|f| &**f)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a32_priority_order() {
        let names: Vec<_> = FamilyChain::a32().iter().map(|f| f.name()).collect();
        assert_eq!(names.first(), Some(&"a32-unconditional"));
        let dp = names.iter().position(|n| *n == "a32-data-processing");
        let ls = names.iter().position(|n| *n == "a32-load-store");
        assert!(dp < ls);
        let svc = names.iter().position(|n| *n == "a32-svc");
        assert!(svc < names.iter().position(|n| *n == "a32-coproc"));
    }

    struct Peer;

    impl InstructionFamily for Peer {
        fn name(&self) -> &'static str {
            "peer"
        }

        fn required_caps(&self) -> HwCaps {
            HwCaps::NEON
        }

        fn lift(&self, _ctx: &mut DecodeContext<'_>, _insn: u32) -> Outcome {
            Outcome::NotMatched
        }
    }

    #[test]
    fn test_with_family_appends() {
        let chain = FamilyChain::thumb16().with_family(Peer);
        assert_eq!(chain.len(), 4);
        let last = chain.iter().last().map(|f| (f.name(), f.required_caps()));
        assert_eq!(last, Some(("peer", HwCaps::NEON)));
        assert!(FamilyChain::empty().is_empty());
    }
}
