//! Client-request sequences.
//!
//! A program running under the translator talks to it through 20-byte
//! sequences: four rotates of the scratch register by a total of 64 bits
//! (a no-op on hardware) followed by a marker `ORR rN, rN, rN`. The byte
//! patterns are the Valgrind ARM client-request ABI.

use armlift_ir::{Expr, JumpKind};
use tracing::debug;

use crate::context::DecodeContext;
use crate::dispatch::{fetch_a32, fetch_t32};
use crate::guard::Guard;
use crate::layout::{OFFB_CMLEN, OFFB_CMSTART, OFFB_NRADDR};
use crate::types::{InstrSet, REG_LR};

/// Length of a recognised sequence in bytes.
pub const SPECIAL_LEN: u32 = 20;

/// `MOV r12, r12, ROR #3/#13/#29/#19`
const A32_PREAMBLE: [u32; 4] = [0xe1a0_c1ec, 0xe1a0_c6ec, 0xe1a0_ceec, 0xe1a0_c9ec];
/// `MOV.W r12, r12, ROR #3/#13/#29/#19`
const T32_PREAMBLE: [u32; 4] = [0xea4f_0cfc, 0xea4f_3c7c, 0xea4f_7c7c, 0xea4f_4cfc];

/// Request selected by the marker instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Special {
    /// `R3 = client_request(R4)`: leave to the translator.
    ClientRequest,
    /// `R3 = guest_NRADDR`.
    GetNrAddr,
    /// Branch-and-link to `R4` without function redirection.
    CallNoRedirR4,
    /// Discard cached translations of this sequence.
    InjectIr,
}

impl Special {
    const fn from_marker(marker: u32, iset: InstrSet) -> Option<Self> {
        Some(match (iset, marker) {
            (InstrSet::A32, 0xe18a_a00a) | (InstrSet::Thumb, 0xea4a_0a0a) => Self::ClientRequest,
            (InstrSet::A32, 0xe18b_b00b) | (InstrSet::Thumb, 0xea4b_0b0b) => Self::GetNrAddr,
            (InstrSet::A32, 0xe18c_c00c) | (InstrSet::Thumb, 0xea4c_0c0c) => Self::CallNoRedirR4,
            (InstrSet::A32, 0xe189_9009) | (InstrSet::Thumb, 0xea49_0909) => Self::InjectIr,
            _ => return None,
        })
    }
}

/// Result of looking for a sequence at the start of `code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recognized {
    /// No preamble; decode normally.
    No,
    Special(Special),
    /// A preamble followed by an unknown marker.
    BadMarker(u32),
}

/// Check whether `code` starts with a client-request sequence.
pub fn recognize(code: &[u8], iset: InstrSet) -> Recognized {
    let fetch = |at: usize| match iset {
        InstrSet::A32 => fetch_a32(code, at),
        InstrSet::Thumb => fetch_t32(code, at),
    };
    let preamble = match iset {
        InstrSet::A32 => &A32_PREAMBLE,
        InstrSet::Thumb => &T32_PREAMBLE,
    };
    let matched = preamble
        .iter()
        .enumerate()
        .all(|(i, word)| fetch(4 * i) == Some(*word));
    if !matched {
        return Recognized::No;
    }
    match fetch(16) {
        Some(marker) => Special::from_marker(marker, iset)
            .map_or(Recognized::BadMarker(marker), Recognized::Special),
        None => Recognized::No,
    }
}

/// Emit the effect of a recognised sequence.
pub(crate) fn emit(ctx: &mut DecodeContext<'_>, special: Special) {
    debug!(pc = format!("{:#x}", ctx.pc), ?special, "client request sequence");
    let next = ctx.next_pc_tagged();
    match special {
        Special::ClientRequest => {
            ctx.write_pc(Expr::u32(next), Guard::Always, JumpKind::ClientReq);
        }
        Special::GetNrAddr => {
            ctx.put_reg(3, Expr::get32(OFFB_NRADDR), Guard::Always);
        }
        Special::CallNoRedirR4 => {
            let target = ctx.read_reg(4);
            ctx.put_reg(REG_LR, Expr::u32(next), Guard::Always);
            ctx.write_pc(target, Guard::Always, JumpKind::NoRedir);
        }
        Special::InjectIr => {
            ctx.irsb.put(OFFB_CMSTART, Expr::u32(ctx.pc));
            ctx.irsb.put(OFFB_CMLEN, Expr::u32(SPECIAL_LEN));
            ctx.write_pc(Expr::u32(next), Guard::Always, JumpKind::InvalICache);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a32_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn t32_bytes(words: &[u32]) -> Vec<u8> {
        words
            .iter()
            .flat_map(|w| {
                let [a, b] = ((w >> 16) as u16).to_le_bytes();
                let [c, d] = (*w as u16).to_le_bytes();
                [a, b, c, d]
            })
            .collect()
    }

    #[test]
    fn test_recognize_a32_markers() {
        let mut words = A32_PREAMBLE.to_vec();
        words.push(0xe18a_a00a);
        let code = a32_bytes(&words);
        assert_eq!(
            recognize(&code, InstrSet::A32),
            Recognized::Special(Special::ClientRequest)
        );
        words[4] = 0xe189_9009;
        assert_eq!(
            recognize(&a32_bytes(&words), InstrSet::A32),
            Recognized::Special(Special::InjectIr)
        );
    }

    #[test]
    fn test_recognize_thumb_marker() {
        let mut words = T32_PREAMBLE.to_vec();
        words.push(0xea4b_0b0b);
        let code = t32_bytes(&words);
        assert_eq!(code[..4], [0x4f, 0xea, 0xfc, 0x0c]);
        assert_eq!(
            recognize(&code, InstrSet::Thumb),
            Recognized::Special(Special::GetNrAddr)
        );
        // the A32 patterns do not apply to Thumb code
        assert_eq!(recognize(&code, InstrSet::A32), Recognized::No);
    }

    #[test]
    fn test_unknown_marker_and_short_buffer() {
        let mut words = A32_PREAMBLE.to_vec();
        words.push(0xe1a0_0000);
        let code = a32_bytes(&words);
        assert_eq!(recognize(&code, InstrSet::A32), Recognized::BadMarker(0xe1a0_0000));
        assert_eq!(recognize(&code[..16], InstrSet::A32), Recognized::No);
    }
}
