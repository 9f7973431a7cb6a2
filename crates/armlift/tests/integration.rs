//! End-to-end tests: lift blocks through the driver and execute them on the
//! reference interpreter.

mod test_utils;

use std::io::Write;

use armlift::{
    ArchInfo, BlockEnd, DecodeStatus, Error, InstrSet, JumpKind, LiftOptions, lift_block,
    parse_hex_code, read_code_file,
};
use test_utils::{BASE, a32, lift, run, thumb};

const Z: u32 = 1 << 30;
const C: u32 = 1 << 29;

const ADD_R1_R2_R3: u32 = 0xe082_1003;
const NOP: u32 = 0xe1a0_0000;

#[test]
fn test_a32_block_returns_through_lr() {
    // adds r1, r2, r3 ; mov pc, lr
    let code = a32(&[0xe092_1003, 0xe1a0_f00e]);
    let (m, exit, lifted) = run(
        &code,
        BASE,
        &LiftOptions::default(),
        &[(2, 5), (3, 7), (14, 0x2000)],
        0,
    );
    assert_eq!(lifted.insns, 2);
    assert_eq!(lifted.end, BlockEnd::Stop);
    assert_eq!(lifted.jumpkind(), JumpKind::Ret);
    assert_eq!(m.reg(1).unwrap(), 12);
    assert_eq!(m.nzcv().unwrap(), 0);
    assert_eq!(exit.jk, JumpKind::Ret);
    assert_eq!(exit.dst, 0x2000);
    assert_eq!(m.pc().unwrap(), 0x2000);
    assert!(!exit.side_exit);
}

#[test]
fn test_block_falls_off_end_of_buffer() {
    let code = a32(&[ADD_R1_R2_R3]);
    let (m, exit, lifted) = run(&code, BASE, &LiftOptions::default(), &[(2, 1), (3, 2)], 0);
    assert_eq!(lifted.end, BlockEnd::EndOfBuffer);
    assert_eq!(exit.jk, JumpKind::Boring);
    assert_eq!(exit.dst, 0x1004);
    assert_eq!(m.reg(1).unwrap(), 3);
}

#[test]
fn test_block_respects_instruction_limit() {
    let code = a32(&[ADD_R1_R2_R3; 3]);
    let opts = LiftOptions::default().with_max_insns(2);
    let (_, exit, lifted) = run(&code, BASE, &opts, &[], 0);
    assert_eq!(lifted.insns, 2);
    assert_eq!(lifted.end, BlockEnd::Limit);
    assert_eq!(exit.dst, 0x1008);
}

#[test]
fn test_first_instruction_failure_is_an_error() {
    let code = a32(&[0xe7f0_00f0]);
    let err = lift_block(&code, BASE, BASE, &ArchInfo::default(), &LiftOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Decode { pc: 0x1000 }));

    let err = lift_block(&code, BASE, 0x2000, &ArchInfo::default(), &LiftOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::OutOfBuffer { pc: 0x2000 }));
}

#[test]
fn test_later_failure_ends_block_with_nodecode() {
    let code = a32(&[ADD_R1_R2_R3, 0xe7f0_00f0]);
    let (m, exit, lifted) = run(&code, BASE, &LiftOptions::default(), &[(2, 5), (3, 7)], 0);
    assert_eq!(lifted.insns, 1);
    assert_eq!(lifted.end, BlockEnd::DecodeFailure);
    assert_eq!(lifted.last.status, DecodeStatus::Failed);
    assert_eq!(exit.jk, JumpKind::NoDecode);
    assert_eq!(exit.dst, 0x1004);
    assert_eq!(m.reg(1).unwrap(), 12);
}

#[test]
fn test_unconditional_branch_is_followed_in_buffer() {
    // b 0x1010 ; (skipped) ; add r1, r2, r3
    let code = a32(&[0xea00_0002, NOP, NOP, NOP, ADD_R1_R2_R3]);
    let (m, exit, lifted) = run(&code, BASE, &LiftOptions::default(), &[(2, 5), (3, 7)], 0);
    assert_eq!(lifted.pcs, [0x1000, 0x1010]);
    assert_eq!(exit.dst, 0x1014);
    assert_eq!(m.reg(1).unwrap(), 12);
}

#[test]
fn test_conditional_branch_without_chasing_stops() {
    // loop: subs r0, r0, #1 ; bne loop
    let code = a32(&[0xe250_0001, 0x1aff_fffd]);
    let (m, exit, lifted) = run(&code, BASE, &LiftOptions::default(), &[(0, 2)], 0);
    assert_eq!(lifted.end, BlockEnd::Stop);
    assert_eq!(lifted.insns, 2);
    assert_eq!(m.reg(0).unwrap(), 1);
    assert!(exit.side_exit);
    assert_eq!(exit.dst, 0x1000);
}

#[test]
fn test_chased_loop_unrolls_until_limit() {
    let code = a32(&[0xe250_0001, 0x1aff_fffd]);
    let opts = LiftOptions::default().with_chase_cond(true).with_max_insns(4);

    let (m, exit, lifted) = run(&code, BASE, &opts, &[(0, 2)], 0);
    assert_eq!(lifted.pcs, [0x1000, 0x1004, 0x1000, 0x1004]);
    assert_eq!(lifted.end, BlockEnd::Limit);
    // second iteration falls out of the loop
    assert_eq!(m.reg(0).unwrap(), 0);
    assert!(exit.side_exit);
    assert_eq!(exit.dst, 0x1008);

    let (m, exit, _) = run(&code, BASE, &opts, &[(0, 5)], 0);
    assert_eq!(m.reg(0).unwrap(), 3);
    assert!(!exit.side_exit);
    assert_eq!(exit.jk, JumpKind::Boring);
    assert_eq!(exit.dst, 0x1000);
}

#[test]
fn test_cleanup_passes_preserve_behaviour() {
    // adds r1, r2, r3 ; addeq r4, r1, #1
    let code = a32(&[0xe092_1003, 0x0281_4001]);
    for (r2, r3) in [(1, u32::MAX), (1, 2)] {
        let regs = [(2, r2), (3, r3)];
        let (plain, plain_exit, _) =
            run(&code, BASE, &LiftOptions::default().with_optimize(false), &regs, 0);
        let (opt, opt_exit, _) = run(&code, BASE, &LiftOptions::default(), &regs, 0);
        assert_eq!(plain.state, opt.state);
        assert_eq!(plain_exit, opt_exit);
    }
    let (m, _, _) = run(&code, BASE, &LiftOptions::default(), &[(2, 1), (3, u32::MAX)], 0);
    assert_eq!(m.reg(4).unwrap(), 1);
    assert_eq!(m.nzcv().unwrap(), Z | C);
}

#[test]
fn test_thumb_adds_set_flags_outside_it_block() {
    // adds r0, #1 ; adds r0, #1
    let code = thumb(&[0x3001, 0x3001]);
    let (m, exit, lifted) = run(&code, BASE | 1, &LiftOptions::default(), &[(0, 0xffff_fffe)], 0);
    assert_eq!(lifted.pcs, [0x1001, 0x1003]);
    assert_eq!(m.reg(0).unwrap(), 0);
    assert_eq!(m.nzcv().unwrap(), Z | C);
    assert_eq!(exit.dst, 0x1005);
}

#[test]
fn test_thumb_ite_selects_one_move() {
    // cmp r0, #0 ; ite eq ; moveq r1, #1 ; movne r1, #2
    let code = thumb(&[0x2800, 0xbf0c, 0x2101, 0x2102]);
    let opts = LiftOptions::default();

    let (m, exit, lifted) = run(&code, BASE | 1, &opts, &[(0, 0)], 0);
    assert_eq!(lifted.insns, 4);
    assert_eq!(m.reg(1).unwrap(), 1);
    assert_eq!(exit.dst, 0x1009);

    let (m, _, _) = run(&code, BASE | 1, &opts, &[(0, 5)], 0);
    assert_eq!(m.reg(1).unwrap(), 2);
    // the moves inside the block leave the compare's flags alone
    assert_eq!(m.nzcv().unwrap(), C);
}

#[test]
fn test_thumb_wide_add_then_return() {
    // add.w r1, r2, r3 ; bx lr
    let code = parse_hex_code(&["eb020103", "4770"], InstrSet::Thumb).unwrap();
    let (m, exit, lifted) = run(
        &code,
        BASE | 1,
        &LiftOptions::default(),
        &[(2, 40), (3, 2), (14, 0x2001)],
        0,
    );
    assert_eq!(lifted.pcs, [0x1001, 0x1005]);
    assert_eq!(m.reg(1).unwrap(), 42);
    assert_eq!(exit.jk, JumpKind::Ret);
    assert_eq!(exit.dst, 0x2001);
}

#[test]
fn test_thumb_bl_leaves_block_as_call() {
    let code = thumb(&[0xf000, 0xf808]);
    let (m, exit, lifted) = run(&code, BASE | 1, &LiftOptions::default(), &[], 0);
    assert_eq!(lifted.jumpkind(), JumpKind::Call);
    assert_eq!(exit.dst, 0x1015);
    assert_eq!(m.reg(14).unwrap(), 0x1005);
}

#[test]
fn test_thumb_nraddr_request_continues() {
    let code = parse_hex_code(
        &["ea4f0cfc", "ea4f3c7c", "ea4f7c7c", "ea4f4cfc", "ea4b0b0b"],
        InstrSet::Thumb,
    )
    .unwrap();
    let (m, exit, lifted) = run(&code, BASE | 1, &LiftOptions::default(), &[(3, 7)], 0);
    assert_eq!(lifted.insns, 1);
    assert_eq!(m.reg(3).unwrap(), 0);
    assert_eq!(exit.dst, 0x1015);
}

#[test]
fn test_a32_client_request_stops_block() {
    let code = a32(&[0xe1a0_c1ec, 0xe1a0_c6ec, 0xe1a0_ceec, 0xe1a0_c9ec, 0xe18a_a00a, NOP]);
    let lifted = lift(&code, BASE, &LiftOptions::default());
    assert_eq!(lifted.insns, 1);
    assert_eq!(lifted.jumpkind(), JumpKind::ClientReq);
    assert_eq!(lifted.last.len, 20);
}

#[test]
fn test_code_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&a32(&[ADD_R1_R2_R3, 0xe1a0_f00e])).unwrap();
    file.flush().unwrap();

    let code = read_code_file(file.path(), InstrSet::A32).unwrap();
    let lifted = lift(&code, BASE, &LiftOptions::default());
    assert_eq!(lifted.insns, 2);
    assert_eq!(lifted.jumpkind(), JumpKind::Ret);
}

#[test]
fn test_code_file_must_hold_whole_instructions() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0x03, 0x10, 0x82, 0xe0, 0x00, 0x00]).unwrap();
    file.flush().unwrap();

    let err = read_code_file(file.path(), InstrSet::A32).unwrap_err();
    assert!(matches!(err, Error::OddLength { len: 6, unit: 4 }));
    // the same bytes are three Thumb halfwords
    assert!(read_code_file(file.path(), InstrSet::Thumb).is_ok());
}
