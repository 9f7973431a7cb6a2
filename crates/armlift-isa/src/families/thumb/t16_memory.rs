//! 16-bit Thumb loads and stores: literal, register offset, immediate
//! offset, SP-relative, PUSH/POP and LDM/STM.

use armlift_ir::{Expr, LoadCvt};

use crate::bits::{field, lo_reg, matches};
use crate::context::DecodeContext;
use crate::families::memory::{Addressing, Multiple, emit_load, emit_multiple, emit_store};
use crate::families::{InstructionFamily, Outcome};
use crate::guard;
use crate::types::{REG_LR, REG_PC, REG_SP};

pub struct T16Memory;

impl InstructionFamily for T16Memory {
    fn name(&self) -> &'static str {
        "t16-memory"
    }

    fn lift(&self, ctx: &mut DecodeContext<'_>, insn: u32) -> Outcome {
        let hw = insn & 0xffff;
        match hw >> 12 {
            // LDR (literal)
            0b0100 if matches(hw, 0xf800, 0x4800) => {
                let imm = Expr::u32(field(hw, 7, 0) << 2);
                emit_load(ctx, LoadCvt::Ident32, lo_reg(hw, 8), &Addressing::offset(REG_PC, imm, true));
            }
            // register offset: 0101 opB Rm Rn Rt
            0b0101 => {
                let rm = ctx.read_reg(lo_reg(hw, 6));
                let am = Addressing::offset(lo_reg(hw, 3), rm, true);
                let rt = lo_reg(hw, 0);
                match field(hw, 11, 9) {
                    0b000 => emit_store(ctx, LoadCvt::Ident32, rt, &am),
                    0b001 => emit_store(ctx, LoadCvt::Zext16To32, rt, &am),
                    0b010 => emit_store(ctx, LoadCvt::Zext8To32, rt, &am),
                    0b011 => emit_load(ctx, LoadCvt::Sext8To32, rt, &am),
                    0b100 => emit_load(ctx, LoadCvt::Ident32, rt, &am),
                    0b101 => emit_load(ctx, LoadCvt::Zext16To32, rt, &am),
                    0b110 => emit_load(ctx, LoadCvt::Zext8To32, rt, &am),
                    _ => emit_load(ctx, LoadCvt::Sext16To32, rt, &am),
                }
            }
            // STR/LDR, STRB/LDRB, STRH/LDRH (immediate)
            0b0110..=0b1000 => {
                let (cvt, scale) = match hw >> 12 {
                    0b0110 => (LoadCvt::Ident32, 2),
                    0b0111 => (LoadCvt::Zext8To32, 0),
                    _ => (LoadCvt::Zext16To32, 1),
                };
                let imm = Expr::u32(field(hw, 10, 6) << scale);
                let am = Addressing::offset(lo_reg(hw, 3), imm, true);
                transfer(ctx, matches(hw, 0x0800, 0x0800), cvt, lo_reg(hw, 0), &am);
            }
            // STR/LDR (SP-relative)
            0b1001 => {
                let imm = Expr::u32(field(hw, 7, 0) << 2);
                let am = Addressing::offset(REG_SP, imm, true);
                transfer(ctx, matches(hw, 0x0800, 0x0800), LoadCvt::Ident32, lo_reg(hw, 8), &am);
            }
            // PUSH: 1011 010M list
            0b1011 if matches(hw, 0x0e00, 0x0400) => {
                let regs = field(hw, 7, 0) as u16 | (field(hw, 8, 8) as u16) << REG_LR;
                if regs == 0 {
                    return Outcome::Undefined;
                }
                let m = Multiple {
                    rn: REG_SP,
                    regs,
                    increment: false,
                    before: true,
                    wback: true,
                };
                emit_multiple(ctx, false, m);
            }
            // POP: 1011 110P list
            0b1011 if matches(hw, 0x0e00, 0x0c00) => {
                let loads_pc = matches(hw, 0x0100, 0x0100);
                let regs = field(hw, 7, 0) as u16 | u16::from(loads_pc) << REG_PC;
                if regs == 0 {
                    return Outcome::Undefined;
                }
                if loads_pc {
                    guard::sigill_if_in_but_not_last(ctx);
                }
                let m = Multiple {
                    rn: REG_SP,
                    regs,
                    increment: true,
                    before: false,
                    wback: true,
                };
                emit_multiple(ctx, true, m);
            }
            // STM/LDM (increment after)
            0b1100 => {
                let rn = lo_reg(hw, 8);
                let regs = field(hw, 7, 0) as u16;
                if regs == 0 {
                    return Outcome::Undefined;
                }
                let load_op = matches(hw, 0x0800, 0x0800);
                let m = Multiple {
                    rn,
                    regs,
                    increment: true,
                    before: false,
                    // LDM writes back only when the base is not loaded
                    wback: !load_op || regs & (1 << rn) == 0,
                };
                emit_multiple(ctx, load_op, m);
            }
            _ => return Outcome::NotMatched,
        }
        Outcome::Lifted
    }
}

fn transfer(ctx: &mut DecodeContext<'_>, load_op: bool, cvt: LoadCvt, rt: u8, am: &Addressing) {
    if load_op {
        emit_load(ctx, cvt, rt, am);
    } else {
        emit_store(ctx, cvt, rt, am);
    }
}
