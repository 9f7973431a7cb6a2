//! Running lifted blocks on the reference interpreter.

use armlift_ir::{ExitInfo, GuestState, Interp, Memory};
use armlift_isa::FlagHelpers;
use armlift_isa::flags::{CcOp, calculate_nzcv};
use armlift_isa::layout::{
    GUEST_STATE_SIZE, OFFB_CC_DEP1, OFFB_CC_DEP2, OFFB_CC_NDEP, OFFB_CC_OP, OFFB_R15T, reg_offset,
};

use crate::block::LiftedBlock;
use crate::error::{Error, Result};

/// Guest state and memory for running blocks.
pub struct Machine {
    pub state: GuestState,
    pub mem: Memory,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Zeroed registers, flags clear, empty memory.
    pub fn new() -> Self {
        Self {
            state: GuestState::new(GUEST_STATE_SIZE),
            mem: Memory::new(),
        }
    }

    /// Map `code` at `base_addr` so literal loads can see it.
    #[must_use]
    pub fn with_code(mut self, code: &[u8], base_addr: u32) -> Self {
        self.mem.map(base_addr, code);
        self
    }

    pub fn reg(&self, r: u8) -> Result<u32> {
        Ok(self.state.u32_at(reg_offset(r))?)
    }

    pub fn set_reg(&mut self, r: u8, value: u32) -> Result<()> {
        Ok(self.state.set_u32(reg_offset(r), value)?)
    }

    /// Program counter slot, Thumb bit included.
    pub fn pc(&self) -> Result<u32> {
        Ok(self.state.u32_at(OFFB_R15T)?)
    }

    /// Condition flags in bits 31:28, evaluated from the flags thunk.
    pub fn nzcv(&self) -> Result<u32> {
        let op = self.state.u32_at(OFFB_CC_OP)?;
        let op = CcOp::from_u32(op).ok_or(Error::BadFlagsThunk(op))?;
        Ok(calculate_nzcv(
            op,
            self.state.u32_at(OFFB_CC_DEP1)?,
            self.state.u32_at(OFFB_CC_DEP2)?,
            self.state.u32_at(OFFB_CC_NDEP)?,
        ))
    }

    /// Replace the flags thunk with a copy of `nzcv` (bits 31:28).
    pub fn set_nzcv(&mut self, nzcv: u32) -> Result<()> {
        self.state.set_u32(OFFB_CC_OP, CcOp::Copy as u32)?;
        self.state.set_u32(OFFB_CC_DEP1, nzcv & 0xf000_0000)?;
        self.state.set_u32(OFFB_CC_DEP2, 0)?;
        self.state.set_u32(OFFB_CC_NDEP, 0)?;
        Ok(())
    }

    /// Execute `lifted` until it leaves through a side exit or its end.
    pub fn run(&mut self, lifted: &LiftedBlock) -> Result<ExitInfo> {
        Interp::new(OFFB_R15T, &FlagHelpers)
            .run(&lifted.block, &mut self.state, &mut self.mem)
            .map_err(Error::from)
    }
}

/// Parse `r1=5`, `sp=0x8000` or `lr=-1` into a register number and value.
pub fn parse_reg_assignment(s: &str) -> Result<(u8, u32)> {
    let bad = || Error::InvalidRegister(s.to_string());
    let (name, value) = s.split_once('=').ok_or_else(bad)?;
    let reg = match name.trim().to_ascii_lowercase().as_str() {
        "sp" => 13,
        "lr" => 14,
        "pc" => 15,
        "ip" => 12,
        "fp" => 11,
        other => {
            let n: u8 = other
                .strip_prefix('r')
                .and_then(|n| n.parse().ok())
                .ok_or_else(bad)?;
            if n > 15 {
                return Err(bad());
            }
            n
        }
    };
    let value = value.trim();
    let parsed = if let Some(hex) = value.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(neg) = value.strip_prefix('-') {
        neg.parse::<u32>().ok().map(u32::wrapping_neg)
    } else {
        value.parse().ok()
    };
    Ok((reg, parsed.ok_or_else(bad)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reg_assignment() {
        assert_eq!(parse_reg_assignment("r1=5").unwrap(), (1, 5));
        assert_eq!(parse_reg_assignment("SP=0x8000").unwrap(), (13, 0x8000));
        assert_eq!(parse_reg_assignment("lr=-1").unwrap(), (14, u32::MAX));
        assert!(parse_reg_assignment("r16=1").is_err());
        assert!(parse_reg_assignment("r1").is_err());
        assert!(parse_reg_assignment("r1=zz").is_err());
    }

    #[test]
    fn test_flags_roundtrip_through_copy_thunk() {
        let mut m = Machine::new();
        assert_eq!(m.nzcv().unwrap(), 0);
        m.set_nzcv(0x6000_0005).unwrap();
        assert_eq!(m.nzcv().unwrap(), 0x6000_0000);
    }

    #[test]
    fn test_unknown_flags_thunk_is_an_error() {
        let mut m = Machine::new();
        m.state.set_u32(OFFB_CC_OP, 99).unwrap();
        assert!(matches!(m.nzcv(), Err(Error::BadFlagsThunk(99))));
    }
}
