//! Reference interpreter for IR blocks.
//!
//! Executes a block against a byte-addressed guest state and a sparse
//! little-endian memory. Helper calls are resolved through [`Helpers`], so
//! the interpreter itself stays architecture neutral.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::block::IrBlock;
use crate::expr::Expr;
use crate::jump::JumpKind;
use crate::stmt::{LoadCvt, Stmt};
use crate::types::IrType;

/// Interpreter errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InterpError {
    #[error("read of unmapped memory at {addr:#010x}")]
    Unmapped { addr: u32 },
    #[error("unknown helper `{0}`")]
    UnknownHelper(String),
    #[error("guest state access at offset {offset} out of range")]
    StateOutOfRange { offset: u32 },
    #[error("block has no next expression")]
    Unfinished,
}

pub type InterpResult<T> = std::result::Result<T, InterpError>;

/// Pure helper functions callable from `CCall` expressions.
pub trait Helpers {
    /// Evaluate helper `name`, or `None` if it is unknown.
    fn call(&self, name: &str, args: &[u64]) -> Option<u64>;
}

/// Guest register file as raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestState {
    bytes: Vec<u8>,
}

impl GuestState {
    /// Zeroed state of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    fn slot(&self, offset: u32, ty: IrType) -> InterpResult<std::ops::Range<usize>> {
        let start = offset as usize;
        let end = start + ty.bytes();
        if end > self.bytes.len() {
            return Err(InterpError::StateOutOfRange { offset });
        }
        Ok(start..end)
    }

    pub fn read(&self, offset: u32, ty: IrType) -> InterpResult<u64> {
        let range = self.slot(offset, ty)?;
        let mut buf = [0u8; 8];
        buf[..ty.bytes()].copy_from_slice(&self.bytes[range]);
        Ok(u64::from_le_bytes(buf) & ty.mask())
    }

    pub fn write(&mut self, offset: u32, ty: IrType, value: u64) -> InterpResult<()> {
        let range = self.slot(offset, ty)?;
        let n = ty.bytes();
        self.bytes[range].copy_from_slice(&value.to_le_bytes()[..n]);
        Ok(())
    }

    pub fn u32_at(&self, offset: u32) -> InterpResult<u32> {
        self.read(offset, IrType::I32).map(|v| v as u32)
    }

    pub fn set_u32(&mut self, offset: u32, value: u32) -> InterpResult<()> {
        self.write(offset, IrType::I32, u64::from(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Sparse little-endian memory. Bytes never written read as unmapped.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    bytes: FxHashMap<u32, u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `data` at `addr`.
    pub fn map(&mut self, addr: u32, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.bytes.insert(addr.wrapping_add(i as u32), *b);
        }
    }

    pub fn read(&self, addr: u32, ty: IrType) -> InterpResult<u64> {
        let mut value = 0u64;
        for i in 0..ty.bytes() {
            let a = addr.wrapping_add(i as u32);
            let b = self.bytes.get(&a).ok_or(InterpError::Unmapped { addr: a })?;
            value |= u64::from(*b) << (8 * i);
        }
        Ok(value)
    }

    pub fn write(&mut self, addr: u32, ty: IrType, value: u64) {
        for i in 0..ty.bytes() {
            self.bytes
                .insert(addr.wrapping_add(i as u32), (value >> (8 * i)) as u8);
        }
    }

    pub fn read_u32(&self, addr: u32) -> InterpResult<u32> {
        self.read(addr, IrType::I32).map(|v| v as u32)
    }
}

/// How a block was left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitInfo {
    pub jk: JumpKind,
    /// Address written to the PC slot.
    pub dst: u32,
    /// True when a side exit was taken rather than the block end.
    pub side_exit: bool,
}

/// Block interpreter.
pub struct Interp<'h> {
    pc_offset: u32,
    helpers: &'h dyn Helpers,
}

impl<'h> Interp<'h> {
    /// `pc_offset` is the guest state slot that exits write their target to.
    pub fn new(pc_offset: u32, helpers: &'h dyn Helpers) -> Self {
        Self { pc_offset, helpers }
    }

    /// Execute `block` to completion.
    pub fn run(
        &self,
        block: &IrBlock,
        state: &mut GuestState,
        mem: &mut Memory,
    ) -> InterpResult<ExitInfo> {
        let mut temps = vec![0u64; block.temps().len()];
        for stmt in block.stmts() {
            match stmt {
                Stmt::IMark { .. } | Stmt::Fence => {}
                Stmt::WrTmp { tmp, data } => {
                    temps[tmp.index()] = self.eval(data, &temps, state, mem)?;
                }
                Stmt::Put { offset, data } => {
                    let v = self.eval(data, &temps, state, mem)?;
                    state.write(*offset, block.type_of(data), v)?;
                }
                Stmt::Store { addr, data } => {
                    let a = self.eval(addr, &temps, state, mem)? as u32;
                    let v = self.eval(data, &temps, state, mem)?;
                    mem.write(a, block.type_of(data), v);
                }
                Stmt::StoreG { addr, data, guard } => {
                    if self.eval(guard, &temps, state, mem)? != 0 {
                        let a = self.eval(addr, &temps, state, mem)? as u32;
                        let v = self.eval(data, &temps, state, mem)?;
                        mem.write(a, block.type_of(data), v);
                    }
                }
                Stmt::LoadG {
                    dst,
                    cvt,
                    addr,
                    alt,
                    guard,
                } => {
                    let v = if self.eval(guard, &temps, state, mem)? == 0 {
                        self.eval(alt, &temps, state, mem)?
                    } else {
                        let a = self.eval(addr, &temps, state, mem)? as u32;
                        widen(*cvt, mem.read(a, cvt.mem_type())?)
                    };
                    temps[dst.index()] = v;
                }
                Stmt::Exit { guard, jk, dst } => {
                    if self.eval(guard, &temps, state, mem)? != 0 {
                        state.set_u32(self.pc_offset, *dst)?;
                        return Ok(ExitInfo {
                            jk: *jk,
                            dst: *dst,
                            side_exit: true,
                        });
                    }
                }
            }
        }
        let next = block.next().ok_or(InterpError::Unfinished)?;
        let dst = self.eval(next, &temps, state, mem)? as u32;
        state.set_u32(self.pc_offset, dst)?;
        Ok(ExitInfo {
            jk: block.jumpkind(),
            dst,
            side_exit: false,
        })
    }

    fn eval(
        &self,
        e: &Expr,
        temps: &[u64],
        state: &GuestState,
        mem: &Memory,
    ) -> InterpResult<u64> {
        Ok(match e {
            Expr::Const(c) => c.as_u64(),
            Expr::Get { offset, ty } => state.read(*offset, *ty)?,
            Expr::RdTmp(t) => temps[t.index()],
            Expr::Unop { op, arg } => op.eval(self.eval(arg, temps, state, mem)?),
            Expr::Binop { op, left, right } => op.eval(
                self.eval(left, temps, state, mem)?,
                self.eval(right, temps, state, mem)?,
            ),
            Expr::Ite {
                cond,
                iftrue,
                iffalse,
            } => {
                if self.eval(cond, temps, state, mem)? == 0 {
                    self.eval(iffalse, temps, state, mem)?
                } else {
                    self.eval(iftrue, temps, state, mem)?
                }
            }
            Expr::Load { ty, addr } => mem.read(self.eval(addr, temps, state, mem)? as u32, *ty)?,
            Expr::CCall {
                callee,
                ret_ty,
                args,
            } => {
                let vals = args
                    .iter()
                    .map(|a| self.eval(a, temps, state, mem))
                    .collect::<InterpResult<Vec<_>>>()?;
                let v = self
                    .helpers
                    .call(callee, &vals)
                    .ok_or_else(|| InterpError::UnknownHelper((*callee).to_string()))?;
                v & ret_ty.mask()
            }
        })
    }
}

fn widen(cvt: LoadCvt, raw: u64) -> u64 {
    use crate::ops::UnOp;
    match cvt {
        LoadCvt::Ident32 => raw,
        LoadCvt::Zext8To32 => UnOp::Zext8To32.eval(raw),
        LoadCvt::Sext8To32 => UnOp::Sext8To32.eval(raw),
        LoadCvt::Zext16To32 => UnOp::Zext16To32.eval(raw),
        LoadCvt::Sext16To32 => UnOp::Sext16To32.eval(raw),
    }
}
