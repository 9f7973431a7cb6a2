//! Dispatcher and block state machine.
//!
//! [`Lifter::lift_one`] decodes one instruction into the caller's block:
//! IMark, client-request check, guard, family chain, then the decision of
//! how the block continues. A decode failure leaves nothing of the
//! instruction behind except the PC write the driver needs to raise
//! SIGILL.

use armlift_ir::{Expr, IrBlock, JumpKind, Stmt};
use tracing::{debug, trace};

use crate::config::{ArchInfo, ItMode, LiftOptions};
use crate::context::{DecodeContext, Flow, PcWrite};
use crate::families::{Encoding, FamilyChain, InstructionFamily, Outcome};
use crate::flags;
use crate::guard::{self, Guard};
use crate::layout::OFFB_R15T;
use crate::result::DecodeResult;
use crate::special::{self, Recognized, SPECIAL_LEN};
use crate::types::{Cond, InstrSet};

/// Little-endian A32 word at `at`.
pub(crate) fn fetch_a32(code: &[u8], at: usize) -> Option<u32> {
    let bytes = code.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Little-endian Thumb halfword at `at`.
pub(crate) fn fetch_t16(code: &[u8], at: usize) -> Option<u32> {
    let bytes = code.get(at..at.checked_add(2)?)?;
    Some(u32::from(u16::from_le_bytes([bytes[0], bytes[1]])))
}

/// 32-bit Thumb instruction at `at`, first halfword in the upper bits.
pub(crate) fn fetch_t32(code: &[u8], at: usize) -> Option<u32> {
    Some(fetch_t16(code, at)? << 16 | fetch_t16(code, at + 2)?)
}

/// Check if a first halfword starts a 32-bit Thumb instruction.
pub const fn is_t32_prefix(hw1: u32) -> bool {
    matches!(hw1 >> 11, 0b11101..=0b11111)
}

const fn never_resteer(_: u32) -> bool {
    false
}

/// Per-call inputs of [`Lifter::lift_one`].
#[derive(Clone, Copy)]
pub struct LiftRequest<'a> {
    /// Instruction stream; bytes before `delta` are visible to the IT
    /// lookback.
    pub code: &'a [u8],
    /// Offset of the instruction within `code`.
    pub delta: usize,
    /// Address of the instruction; bit 0 selects Thumb.
    pub guest_pc: u32,
    pub it: ItMode,
    /// Decides whether a branch target may be lifted into the same block.
    pub resteer_ok: &'a dyn Fn(u32) -> bool,
}

impl<'a> LiftRequest<'a> {
    pub fn new(code: &'a [u8], delta: usize, guest_pc: u32) -> Self {
        Self {
            code,
            delta,
            guest_pc,
            it: ItMode::Dynamic,
            resteer_ok: &never_resteer,
        }
    }

    #[must_use]
    pub const fn with_it(mut self, it: ItMode) -> Self {
        self.it = it;
        self
    }

    #[must_use]
    pub fn with_resteer(mut self, resteer_ok: &'a dyn Fn(u32) -> bool) -> Self {
        self.resteer_ok = resteer_ok;
        self
    }
}

/// Instruction lifter for one guest configuration.
pub struct Lifter {
    arch: ArchInfo,
    opts: LiftOptions,
    a32: FamilyChain,
    t16: FamilyChain,
    t32: FamilyChain,
}

impl Lifter {
    /// Lifter with the standard family chains.
    pub fn new(arch: ArchInfo, opts: LiftOptions) -> Self {
        Self {
            arch,
            opts,
            a32: FamilyChain::a32(),
            t16: FamilyChain::thumb16(),
            t32: FamilyChain::thumb32(),
        }
    }

    /// Add a family (a VFP or Advanced SIMD table, say) after the standard
    /// ones for `encoding`.
    #[must_use]
    pub fn with_family(mut self, encoding: Encoding, family: impl InstructionFamily + 'static) -> Self {
        let chain = match encoding {
            Encoding::A32 => &mut self.a32,
            Encoding::T16 => &mut self.t16,
            Encoding::T32 => &mut self.t32,
        };
        *chain = std::mem::replace(chain, FamilyChain::empty()).with_family(family);
        self
    }

    pub const fn arch(&self) -> &ArchInfo {
        &self.arch
    }

    pub const fn options(&self) -> &LiftOptions {
        &self.opts
    }

    /// Decode the instruction at `req.code[req.delta..]` and append its IR
    /// to `irsb`.
    pub fn lift_one(&self, irsb: &mut IrBlock, req: &LiftRequest<'_>) -> DecodeResult {
        let start = irsb.mark();
        if let Some(result) = self.try_lift(irsb, req) {
            return result;
        }
        let code = req.code.get(req.delta..).unwrap_or_default();
        debug!(
            pc = format!("{:#x}", req.guest_pc),
            bytes = ?&code[..code.len().min(4)],
            "decode failure"
        );
        irsb.rollback(start);
        irsb.put(OFFB_R15T, Expr::u32(req.guest_pc));
        DecodeResult::failed()
    }

    fn try_lift(&self, irsb: &mut IrBlock, req: &LiftRequest<'_>) -> Option<DecodeResult> {
        let iset = InstrSet::from_pc(req.guest_pc);
        let pc = req.guest_pc & !1;
        let code = req.code.get(req.delta..)?;

        let special = special::recognize(code, iset);
        let (len, insn, encoding) = match (special, iset) {
            (Recognized::BadMarker(_), _) => return None,
            (Recognized::Special(_), _) => (SPECIAL_LEN, 0, Encoding::A32),
            (Recognized::No, InstrSet::A32) => {
                if pc & 3 != 0 {
                    return None;
                }
                (4, fetch_a32(code, 0)?, Encoding::A32)
            }
            (Recognized::No, InstrSet::Thumb) => {
                let hw1 = fetch_t16(code, 0)?;
                if is_t32_prefix(hw1) {
                    (4, fetch_t32(code, 0)?, Encoding::T32)
                } else {
                    (2, hw1, Encoding::T16)
                }
            }
        };

        irsb.push(Stmt::imark(pc, len, u8::from(iset == InstrSet::Thumb)));
        let mut ctx = DecodeContext::new(irsb, &self.arch, &self.opts, req.resteer_ok, req.guest_pc, len);

        if let Recognized::Special(kind) = special {
            special::emit(&mut ctx, kind);
            return Some(finish(&mut ctx));
        }

        match iset {
            InstrSet::A32 => {
                let cond = insn >> 28;
                if cond != 0xf {
                    ctx.guard = flags::condition(&mut ctx, Cond::from_bits(cond));
                }
            }
            InstrSet::Thumb => guard::begin_thumb(&mut ctx, req.code, req.delta, req.it),
        }

        let chain = match encoding {
            Encoding::A32 => &self.a32,
            Encoding::T16 => &self.t16,
            Encoding::T32 => &self.t32,
        };
        let guard = ctx.guard;
        let body = ctx.irsb.mark();
        for family in chain.iter() {
            if !self.arch.hwcaps.contains(family.required_caps()) {
                continue;
            }
            match family.lift(&mut ctx, insn) {
                Outcome::Lifted => {
                    trace!(
                        pc = format!("{:#x}", pc),
                        insn = format!("{:#x}", insn),
                        ?encoding,
                        family = family.name(),
                        "lifted"
                    );
                    return Some(finish(&mut ctx));
                }
                Outcome::Undefined => {
                    trace!(family = family.name(), "undefined encoding");
                    return None;
                }
                Outcome::NotMatched => {
                    ctx.irsb.rollback(body);
                    ctx.guard = guard;
                    ctx.r15 = None;
                    ctx.flow = Flow::Continue;
                }
            }
        }
        None
    }
}

/// Decide how the block continues after a lifted instruction.
fn finish(ctx: &mut DecodeContext<'_>) -> DecodeResult {
    let len = ctx.len;
    if let Some(PcWrite { guard, jk }) = ctx.r15 {
        if let Guard::When(g) = guard {
            // the write did not happen: continue with the next instruction
            let next = ctx.next_pc_tagged();
            ctx.stmt(Stmt::exit(Expr::not1(Expr::tmp(g)), JumpKind::Boring, next));
        }
        return DecodeResult::stop(len, jk);
    }
    match ctx.flow {
        Flow::Resteer { target, conditional } => DecodeResult::resteer(len, target, conditional),
        Flow::Continue => {
            let next = ctx.next_pc_tagged();
            ctx.irsb.put(OFFB_R15T, Expr::u32(next));
            DecodeResult::continue_(len)
        }
    }
}

/// Lift one instruction with the standard families.
pub fn lift_one(
    irsb: &mut IrBlock,
    req: &LiftRequest<'_>,
    arch: &ArchInfo,
    opts: &LiftOptions,
) -> DecodeResult {
    Lifter::new(*arch, *opts).lift_one(irsb, req)
}

#[cfg(test)]
mod tests {
    use armlift_ir::{ExitInfo, GuestState, Interp, Memory};

    use super::*;
    use crate::config::HwCaps;
    use crate::context::DecodeContext;
    use crate::flags::{CcOp, FlagHelpers};
    use crate::it_state::ItState;
    use crate::layout::{
        GUEST_STATE_SIZE, OFFB_CC_DEP1, OFFB_CC_DEP2, OFFB_CC_OP, OFFB_FPSCR, OFFB_ITSTATE,
        OFFB_TPIDRURO, OFFB_TPIDRURW, dreg_offset, reg_offset,
    };
    use crate::result::NextAction;

    const Z: u32 = 1 << 30;
    const FPSCR_QC: u32 = 1 << 27;

    fn a32(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn thumb(hws: &[u16]) -> Vec<u8> {
        hws.iter().flat_map(|h| h.to_le_bytes()).collect()
    }

    fn lift_with(lifter: &Lifter, req: &LiftRequest<'_>) -> (IrBlock, DecodeResult) {
        let mut irsb = IrBlock::new();
        let res = lifter.lift_one(&mut irsb, req);
        (irsb, res)
    }

    fn lift(code: &[u8], delta: usize, pc: u32) -> (IrBlock, DecodeResult) {
        let lifter = Lifter::new(ArchInfo::default(), LiftOptions::default());
        lift_with(&lifter, &LiftRequest::new(code, delta, pc))
    }

    /// Lift every instruction of a straight-line `code` into one block.
    fn lift_all(lifter: &Lifter, code: &[u8], pc: u32, len: u32) -> IrBlock {
        let mut irsb = IrBlock::new();
        for delta in (0..code.len()).step_by(len as usize) {
            let req = LiftRequest::new(code, delta, pc + delta as u32);
            assert_eq!(lifter.lift_one(&mut irsb, &req), DecodeResult::continue_(len));
        }
        irsb
    }

    fn set_dreg(st: &mut GuestState, d: u8, lo: u32, hi: u32) {
        st.set_u32(dreg_offset(d), lo).unwrap();
        st.set_u32(dreg_offset(d) + 4, hi).unwrap();
    }

    fn dreg(st: &GuestState, d: u8) -> (u32, u32) {
        (
            st.u32_at(dreg_offset(d)).unwrap(),
            st.u32_at(dreg_offset(d) + 4).unwrap(),
        )
    }

    fn state(regs: &[(u8, u32)], nzcv: u32) -> GuestState {
        let mut st = GuestState::new(GUEST_STATE_SIZE);
        for &(r, v) in regs {
            st.set_u32(reg_offset(r), v).unwrap();
        }
        st.set_u32(OFFB_CC_OP, CcOp::Copy as u32).unwrap();
        st.set_u32(OFFB_CC_DEP1, nzcv).unwrap();
        st
    }

    fn run(mut irsb: IrBlock, res: &DecodeResult, st: &mut GuestState) -> ExitInfo {
        irsb.set_next(Expr::get32(OFFB_R15T), res.jk_stop.unwrap_or_default());
        Interp::new(OFFB_R15T, &FlagHelpers)
            .run(&irsb, st, &mut Memory::new())
            .unwrap()
    }

    fn writes(irsb: &IrBlock, slot: u32) -> bool {
        irsb.stmts()
            .iter()
            .any(|s| matches!(s, Stmt::Put { offset, .. } if *offset == slot))
    }

    #[test]
    fn test_add_without_flags() {
        let (irsb, res) = lift(&a32(&[0xe082_1003]), 0, 0x1000);
        assert_eq!(res, DecodeResult::continue_(4));
        assert!(writes(&irsb, reg_offset(1)));
        assert!(!writes(&irsb, OFFB_CC_OP));

        let mut st = state(&[(2, 5), (3, 7)], 0);
        let exit = run(irsb, &res, &mut st);
        assert_eq!(st.u32_at(reg_offset(1)).unwrap(), 12);
        assert_eq!(exit.dst, 0x1004);
    }

    #[test]
    fn test_adds_sets_add_thunk() {
        let (irsb, res) = lift(&a32(&[0xe092_1003]), 0, 0x1000);
        assert_eq!(res, DecodeResult::continue_(4));
        let mut st = state(&[(2, 5), (3, 7)], 0);
        run(irsb, &res, &mut st);
        assert_eq!(st.u32_at(OFFB_CC_OP).unwrap(), CcOp::Add as u32);
        assert_eq!(st.u32_at(OFFB_CC_DEP1).unwrap(), 5);
        assert_eq!(st.u32_at(OFFB_CC_DEP2).unwrap(), 7);
    }

    #[test]
    fn test_mov_pc_lr_returns() {
        let (irsb, res) = lift(&a32(&[0xe1a0_f00e]), 0, 0x1000);
        assert_eq!(res, DecodeResult::stop(4, JumpKind::Ret));
        let mut st = state(&[(14, 0x2000)], 0);
        let exit = run(irsb, &res, &mut st);
        assert_eq!((exit.jk, exit.dst), (JumpKind::Ret, 0x2000));
    }

    #[test]
    fn test_alu_pc_write_interworks_from_v7() {
        // MOV pc, r0
        let code = a32(&[0xe1a0_f000]);
        let req = LiftRequest::new(&code, 0, 0x1000);
        let (irsb, res) = lift(&code, 0, 0x1000);
        assert_eq!(res, DecodeResult::stop(4, JumpKind::Boring));
        let mut st = state(&[(0, 0x2001)], 0);
        assert_eq!(run(irsb, &res, &mut st).dst, 0x2001);

        let v6 = Lifter::new(ArchInfo::new(6, HwCaps::empty()), LiftOptions::default());
        let (irsb, res) = lift_with(&v6, &req);
        let mut st = state(&[(0, 0x2003)], 0);
        assert_eq!(run(irsb, &res, &mut st).dst, 0x2000);
    }

    #[test]
    fn test_register_offset_writeback_onto_index_is_undefined() {
        // LDR r1, [r2, r2]! and LDR r1, [r2], r2
        for word in [0xe7b2_1002, 0xe692_1002] {
            assert_eq!(lift(&a32(&[word]), 0, 0x1000).1, DecodeResult::failed());
        }
        // LDR r1, [r2, r2] does not write back
        let (mut irsb, res) = lift(&a32(&[0xe792_1002]), 0, 0x1000);
        assert_eq!(res, DecodeResult::continue_(4));
        let mut st = state(&[(2, 0x10)], 0);
        let mut mem = Memory::new();
        mem.map(0x20, &0xdead_beefu32.to_le_bytes());
        irsb.set_next(Expr::get32(OFFB_R15T), JumpKind::Boring);
        Interp::new(OFFB_R15T, &FlagHelpers).run(&irsb, &mut st, &mut mem).unwrap();
        assert_eq!(st.u32_at(reg_offset(1)).unwrap(), 0xdead_beef);
        assert_eq!(st.u32_at(reg_offset(2)).unwrap(), 0x10);
    }

    #[test]
    fn test_undefined_word_fails_cleanly() {
        // UDF #0
        let (irsb, res) = lift(&a32(&[0xe7f0_00f0]), 0, 0x1000);
        assert_eq!(res, DecodeResult::failed());
        assert!(!res.is_ok());
        assert_eq!(irsb.stmts(), &[Stmt::put(OFFB_R15T, Expr::u32(0x1000))]);
        assert!(irsb.temps().is_empty());
    }

    #[test]
    fn test_thumb_failure_keeps_thumb_bit() {
        // UDF #0 (T16)
        let (irsb, res) = lift(&thumb(&[0xde00]), 0, 0x1001);
        assert_eq!(res.len, 0);
        assert_eq!(irsb.stmts(), &[Stmt::put(OFFB_R15T, Expr::u32(0x1001))]);
    }

    #[test]
    fn test_misaligned_a32_fails() {
        let (_, res) = lift(&a32(&[0xe082_1003]), 0, 0x1002);
        assert_eq!(res, DecodeResult::failed());
    }

    #[test]
    fn test_truncated_t32_fails() {
        let (_, res) = lift(&thumb(&[0xf000]), 0, 0x1001);
        assert_eq!(res, DecodeResult::failed());
    }

    #[test]
    fn test_conditional_add_is_skipped() {
        // ADDEQ r1, r2, r3
        let (irsb, res) = lift(&a32(&[0x0082_1003]), 0, 0x1000);
        assert_eq!(res, DecodeResult::continue_(4));
        let mut st = state(&[(1, 99), (2, 5), (3, 7)], 0);
        run(irsb, &res, &mut st);
        assert_eq!(st.u32_at(reg_offset(1)).unwrap(), 99);

        let (irsb, res) = lift(&a32(&[0x0082_1003]), 0, 0x1000);
        let mut st = state(&[(1, 99), (2, 5), (3, 7)], Z);
        run(irsb, &res, &mut st);
        assert_eq!(st.u32_at(reg_offset(1)).unwrap(), 12);
    }

    #[test]
    fn test_conditional_pc_write_falls_through() {
        // BXNE lr
        let (irsb, res) = lift(&a32(&[0x112f_ff1e]), 0, 0x1000);
        assert_eq!(res, DecodeResult::stop(4, JumpKind::Ret));
        let mut st = state(&[(14, 0x2000)], Z);
        let exit = run(irsb, &res, &mut st);
        assert!(exit.side_exit);
        assert_eq!((exit.jk, exit.dst), (JumpKind::Boring, 0x1004));
    }

    #[test]
    fn test_it_block_consumes_every_slot() {
        // ITTTT EQ; ADDS r0, #1 (x4)
        let code = thumb(&[0xbf01, 0x3001, 0x3001, 0x3001, 0x3001]);
        let expected = ItState::from_it(0, 0b0001).unwrap();
        for (z, r0_after) in [(0, 0), (Z, 4)] {
            let mut st = state(&[], z);
            let mut it = expected;
            for i in 0..5 {
                let (irsb, res) = lift(&code, 2 * i, 0x1001 + 2 * i as u32);
                assert_eq!(res, DecodeResult::continue_(2));
                run(irsb, &res, &mut st);
                let itstate = st.u32_at(OFFB_ITSTATE).unwrap();
                if i > 0 {
                    it = it.advance();
                }
                assert_eq!(itstate, it.raw(), "after instruction {i}");
            }
            assert_eq!(st.u32_at(OFFB_ITSTATE).unwrap(), 0);
            assert_eq!(st.u32_at(reg_offset(0)).unwrap(), r0_after);
            // flag-setting forms inside the block leave the flags alone
            assert_eq!(st.u32_at(OFFB_CC_OP).unwrap(), CcOp::Copy as u32);
        }
    }

    #[test]
    fn test_always_lane_matches_unconditional() {
        // nine plain halfwords, then MOV r0, r1
        let code = thumb(&[0x4608; 10]);
        let lifter = Lifter::new(ArchInfo::default(), LiftOptions::default());
        let base = LiftRequest::new(&code, 18, 0x1013);

        let (plain, _) = lift_with(&lifter, &base);
        let al = ItState::from_it(0xe, 0b1000).unwrap();
        let (in_al_slot, _) = lift_with(&lifter, &base.with_it(ItMode::Known(al)));
        let (known_none, _) = lift_with(&lifter, &base.with_it(ItMode::Known(ItState::NONE)));
        assert_eq!(plain.stmts(), in_al_slot.stmts());
        assert_eq!(plain.stmts(), known_none.stmts());
    }

    #[test]
    fn test_it_inside_it_block_raises_sigill() {
        let code = thumb(&[0xbf08]);
        let lifter = Lifter::new(ArchInfo::default(), LiftOptions::default());
        let inside = ItState::from_it(0, 0b1100).unwrap();
        let req = LiftRequest::new(&code, 0, 0x1001).with_it(ItMode::Known(inside));
        let (irsb, res) = lift_with(&lifter, &req);
        assert!(res.is_ok());
        let sigill = Stmt::exit(Expr::u1(true), JumpKind::NoDecode, 0x1001);
        assert!(irsb.stmts().contains(&sigill));
    }

    #[test]
    fn test_t32_bl_links_and_calls() {
        // BL .+4+0x10
        let code = thumb(&[0xf000, 0xf808]);
        let (irsb, res) = lift(&code, 0, 0x1001);
        assert_eq!(res, DecodeResult::stop(4, JumpKind::Call));
        let mut st = state(&[], 0);
        let exit = run(irsb, &res, &mut st);
        assert_eq!(exit.dst, 0x1015);
        assert_eq!(st.u32_at(reg_offset(14)).unwrap(), 0x1005);
    }

    #[test]
    fn test_branch_resteers_when_allowed() {
        // B .+8+8
        let code = a32(&[0xea00_0002]);
        let lifter = Lifter::new(ArchInfo::default(), LiftOptions::default());
        let ok = |dst: u32| dst == 0x1010;
        let req = LiftRequest::new(&code, 0, 0x1000).with_resteer(&ok);
        let (irsb, res) = lift_with(&lifter, &req);
        assert_eq!(res, DecodeResult::resteer(4, 0x1010, false));
        assert!(!writes(&irsb, OFFB_R15T));

        let (_, res) = lift(&code, 0, 0x1000);
        assert_eq!(res, DecodeResult::stop(4, JumpKind::Boring));
    }

    #[test]
    fn test_conditional_branch_chases_backward() {
        // BNE .-8 (to itself)
        let code = a32(&[0x1aff_fffe]);
        let opts = LiftOptions::default().with_chase_cond(true);
        let lifter = Lifter::new(ArchInfo::default(), opts);
        let any = |_: u32| true;
        let req = LiftRequest::new(&code, 0, 0x1000).with_resteer(&any);
        let (irsb, res) = lift_with(&lifter, &req);
        assert_eq!(res.next, NextAction::ResteerC);
        assert_eq!(res.continue_at, Some(0x1000));
        // the not-taken side leaves through a side exit
        let mut st = state(&[], Z);
        let exit = run(irsb, &res, &mut st);
        assert!(exit.side_exit);
        assert_eq!(exit.dst, 0x1004);
    }

    #[test]
    fn test_client_request_sequence() {
        let code = a32(&[0xe1a0_c1ec, 0xe1a0_c6ec, 0xe1a0_ceec, 0xe1a0_c9ec, 0xe18a_a00a]);
        let (irsb, res) = lift(&code, 0, 0x1000);
        assert_eq!(res, DecodeResult::stop(20, JumpKind::ClientReq));
        assert_eq!(irsb.stmts()[0], Stmt::imark(0x1000, 20, 0));

        let mut bad = code;
        bad[16..].copy_from_slice(&0xe1a0_0000u32.to_le_bytes());
        let (_, res) = lift(&bad, 0, 0x1000);
        assert_eq!(res, DecodeResult::failed());
    }

    struct Claims;

    impl InstructionFamily for Claims {
        fn name(&self) -> &'static str {
            "claims"
        }

        fn required_caps(&self) -> HwCaps {
            HwCaps::NEON
        }

        fn lift(&self, _ctx: &mut DecodeContext<'_>, _insn: u32) -> Outcome {
            Outcome::Lifted
        }
    }

    #[test]
    fn test_peer_family_gated_by_caps() {
        let code = a32(&[0xe7f0_00f0]);
        let req = LiftRequest::new(&code, 0, 0x1000);
        let without = Lifter::new(ArchInfo::new(7, HwCaps::VFP), LiftOptions::default())
            .with_family(Encoding::A32, Claims);
        assert_eq!(lift_with(&without, &req).1, DecodeResult::failed());

        let with = Lifter::new(ArchInfo::default(), LiftOptions::default())
            .with_family(Encoding::A32, Claims);
        assert_eq!(lift_with(&with, &req).1, DecodeResult::continue_(4));
    }

    #[test]
    fn test_simd_saturation_sets_sticky_qc() {
        // VQADD.S32 d0, d1, d2 ; VQADD.S32 d3, d4, d4
        let code = a32(&[0xf221_0012, 0xf224_3014]);
        let lifter = Lifter::new(ArchInfo::default(), LiftOptions::default());
        let irsb = lift_all(&lifter, &code, 0x1000, 4);

        let mut st = state(&[], 0);
        set_dreg(&mut st, 1, 0x7fff_fff0, 5);
        set_dreg(&mut st, 2, 0x100, 7);
        set_dreg(&mut st, 4, 1, 2);
        let exit = run(irsb, &DecodeResult::continue_(4), &mut st);
        assert_eq!(exit.dst, 0x1008);
        assert_eq!(dreg(&st, 0), (0x7fff_ffff, 12));
        assert_eq!(dreg(&st, 3), (2, 4));
        // the second add did not saturate and leaves QC set
        assert_eq!(st.u32_at(OFFB_FPSCR).unwrap() & FPSCR_QC, FPSCR_QC);
    }

    #[test]
    fn test_simd_without_saturation_keeps_qc_clear() {
        // VQSUB.U32 d0, d1, d2
        let code = a32(&[0xf321_0212]);
        let (irsb, res) = lift(&code, 0, 0x1000);
        let mut st = state(&[], 0);
        set_dreg(&mut st, 1, 9, 9);
        set_dreg(&mut st, 2, 2, 3);
        run(irsb, &res, &mut st);
        assert_eq!(dreg(&st, 0), (7, 6));
        assert_eq!(st.u32_at(OFFB_FPSCR).unwrap(), 0);

        let (irsb, res) = lift(&code, 0, 0x1000);
        let mut st = state(&[], 0);
        set_dreg(&mut st, 1, 1, 9);
        set_dreg(&mut st, 2, 2, 3);
        run(irsb, &res, &mut st);
        assert_eq!(dreg(&st, 0), (0, 6));
        assert_eq!(st.u32_at(OFFB_FPSCR).unwrap(), FPSCR_QC);
    }

    #[test]
    fn test_simd_quad_form() {
        // VQADD.S32 q0, q1, q2
        let (irsb, res) = lift(&a32(&[0xf222_0054]), 0, 0x1000);
        assert_eq!(res, DecodeResult::continue_(4));
        let mut st = state(&[], 0);
        set_dreg(&mut st, 2, 1, 2);
        set_dreg(&mut st, 3, 0x8000_0000, 4);
        set_dreg(&mut st, 4, 10, 20);
        set_dreg(&mut st, 5, 0xffff_ffff, 40);
        run(irsb, &res, &mut st);
        assert_eq!(dreg(&st, 0), (11, 22));
        assert_eq!(dreg(&st, 1), (0x8000_0000, 44));
        assert_eq!(st.u32_at(OFFB_FPSCR).unwrap(), FPSCR_QC);

        // odd register numbers are undefined for Q forms
        assert_eq!(lift(&a32(&[0xf221_0054]), 0, 0x1000).1, DecodeResult::failed());
        let plain = Lifter::new(ArchInfo::new(7, HwCaps::VFP), LiftOptions::default());
        let code = a32(&[0xf222_0054]);
        let req = LiftRequest::new(&code, 0, 0x1000);
        assert_eq!(lift_with(&plain, &req).1, DecodeResult::failed());
    }

    #[test]
    fn test_t32_simd_shares_a32_semantics() {
        // VQADD.S32 d0, d1, d2
        let (irsb, res) = lift(&thumb(&[0xef21, 0x0012]), 0, 0x1001);
        assert_eq!(res, DecodeResult::continue_(4));
        let mut st = state(&[], 0);
        set_dreg(&mut st, 1, 0x8000_0000, 3);
        set_dreg(&mut st, 2, 0xffff_ffff, 4);
        run(irsb, &res, &mut st);
        assert_eq!(dreg(&st, 0), (0x8000_0000, 7));
        assert_eq!(st.u32_at(OFFB_FPSCR).unwrap(), FPSCR_QC);
    }

    #[test]
    fn test_thread_id_registers() {
        // MCR p15, 0, r0, c13, c0, 2 ; MRC p15, 0, r1, c13, c0, 2 ;
        // MRC p15, 0, r2, c13, c0, 3
        let code = a32(&[0xee0d_0f50, 0xee1d_1f50, 0xee1d_2f70]);
        let lifter = Lifter::new(ArchInfo::default(), LiftOptions::default());
        let irsb = lift_all(&lifter, &code, 0x1000, 4);
        let mut st = state(&[(0, 0x1234)], 0);
        st.set_u32(OFFB_TPIDRURO, 0xbeef).unwrap();
        run(irsb, &DecodeResult::continue_(4), &mut st);
        assert_eq!(st.u32_at(OFFB_TPIDRURW).unwrap(), 0x1234);
        assert_eq!(st.u32_at(reg_offset(1)).unwrap(), 0x1234);
        assert_eq!(st.u32_at(reg_offset(2)).unwrap(), 0xbeef);

        // TPIDRURO is read-only
        assert_eq!(lift(&a32(&[0xee0d_0f70]), 0, 0x1000).1, DecodeResult::failed());
        // T32 read of TPIDRURO
        let (irsb, res) = lift(&thumb(&[0xee1d, 0x3f70]), 0, 0x1001);
        let mut st = state(&[], 0);
        st.set_u32(OFFB_TPIDRURO, 7).unwrap();
        run(irsb, &res, &mut st);
        assert_eq!(st.u32_at(reg_offset(3)).unwrap(), 7);
    }
}
