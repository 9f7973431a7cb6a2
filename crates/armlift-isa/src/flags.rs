//! Lazy condition flags.
//!
//! Flag-setting instructions store an operation tag and up to three operand
//! values in the `CC_OP/CC_DEP1/CC_DEP2/CC_NDEP` thunk slots instead of
//! computing NZCV. Readers call pure helpers (`armg_calculate_*`) on the
//! thunk; [`fold_helper`] turns those calls into plain comparisons when the
//! tag is known at lift time.
//!
//! Thunk contents per tag:
//!
//! | tag   | dep1   | dep2          | ndep                    |
//! |-------|--------|---------------|-------------------------|
//! | COPY  | NZCV in bits 31:28 | 0 | 0                      |
//! | ADD   | argL   | argR          | 0                       |
//! | SUB   | argL   | argR          | 0                       |
//! | ADC   | argL   | argR          | old C (bit 0)           |
//! | SBB   | argL   | argR          | old C (bit 0)           |
//! | LOGIC | result | shifter carry | old V (bit 0)           |
//! | MUL   | result | 0             | old C:old V (bits 1:0)  |
//! | MULL  | resLo  | resHi         | old C:old V (bits 1:0)  |

use armlift_ir::{Expr, Helpers, IrType};

use crate::context::DecodeContext;
use crate::guard::Guard;
use crate::layout::{OFFB_CC_DEP1, OFFB_CC_DEP2, OFFB_CC_NDEP, OFFB_CC_OP, OFFB_FPSCR};
use crate::types::Cond;

pub const HELPER_NZCV: &str = "armg_calculate_flags_nzcv";
pub const HELPER_FLAG_N: &str = "armg_calculate_flag_n";
pub const HELPER_FLAG_Z: &str = "armg_calculate_flag_z";
pub const HELPER_FLAG_C: &str = "armg_calculate_flag_c";
pub const HELPER_FLAG_V: &str = "armg_calculate_flag_v";
pub const HELPER_CONDITION: &str = "armg_calculate_condition";
pub const HELPER_FLAG_QC: &str = "armg_calculate_flag_qc";

/// Flags thunk operation tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CcOp {
    Copy = 0,
    Add = 1,
    Sub = 2,
    Adc = 3,
    Sbb = 4,
    Logic = 5,
    Mul = 6,
    Mull = 7,
}

impl CcOp {
    pub const fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::Copy,
            1 => Self::Add,
            2 => Self::Sub,
            3 => Self::Adc,
            4 => Self::Sbb,
            5 => Self::Logic,
            6 => Self::Mul,
            7 => Self::Mull,
            _ => return None,
        })
    }
}

/// Individual flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    N,
    Z,
    C,
    V,
}

impl Flag {
    const fn helper(self) -> &'static str {
        match self {
            Self::N => HELPER_FLAG_N,
            Self::Z => HELPER_FLAG_Z,
            Self::C => HELPER_FLAG_C,
            Self::V => HELPER_FLAG_V,
        }
    }

    /// Bit position in an NZCV word.
    const fn shift(self) -> u32 {
        match self {
            Self::N => 31,
            Self::Z => 30,
            Self::C => 29,
            Self::V => 28,
        }
    }
}

const fn nzcv(n: bool, z: bool, c: bool, v: bool) -> u32 {
    ((n as u32) << 31) | ((z as u32) << 30) | ((c as u32) << 29) | ((v as u32) << 28)
}

/// NZCV in bits 31:28 for a thunk.
pub const fn calculate_nzcv(op: CcOp, dep1: u32, dep2: u32, ndep: u32) -> u32 {
    match op {
        CcOp::Copy => dep1 & 0xf000_0000,
        CcOp::Add => {
            let res = dep1.wrapping_add(dep2);
            let v = ((res ^ dep1) & (res ^ dep2)) >> 31 != 0;
            nzcv(res >> 31 != 0, res == 0, res < dep1, v)
        }
        CcOp::Sub => {
            let res = dep1.wrapping_sub(dep2);
            let v = ((dep1 ^ dep2) & (dep1 ^ res)) >> 31 != 0;
            nzcv(res >> 31 != 0, res == 0, dep1 >= dep2, v)
        }
        CcOp::Adc => {
            let old_c = ndep & 1;
            let res = dep1.wrapping_add(dep2).wrapping_add(old_c);
            let c = if old_c != 0 { res <= dep1 } else { res < dep1 };
            let v = ((res ^ dep1) & (res ^ dep2)) >> 31 != 0;
            nzcv(res >> 31 != 0, res == 0, c, v)
        }
        CcOp::Sbb => {
            let old_c = ndep & 1;
            let res = dep1.wrapping_sub(dep2).wrapping_sub(old_c ^ 1);
            let c = if old_c != 0 { dep1 >= dep2 } else { dep1 > dep2 };
            let v = ((dep1 ^ dep2) & (dep1 ^ res)) >> 31 != 0;
            nzcv(res >> 31 != 0, res == 0, c, v)
        }
        CcOp::Logic => nzcv(dep1 >> 31 != 0, dep1 == 0, dep2 & 1 != 0, ndep & 1 != 0),
        CcOp::Mul => nzcv(dep1 >> 31 != 0, dep1 == 0, ndep & 2 != 0, ndep & 1 != 0),
        CcOp::Mull => nzcv(
            dep2 >> 31 != 0,
            dep1 | dep2 == 0,
            ndep & 2 != 0,
            ndep & 1 != 0,
        ),
    }
}

/// One flag (0 or 1) for a thunk.
pub const fn calculate_flag(flag: Flag, op: CcOp, dep1: u32, dep2: u32, ndep: u32) -> u32 {
    (calculate_nzcv(op, dep1, dep2, ndep) >> flag.shift()) & 1
}

/// Evaluate `cond_n_op = (cond << 4) | op` against a thunk; 0 or 1.
pub const fn calculate_condition(cond_n_op: u32, dep1: u32, dep2: u32, ndep: u32) -> Option<u32> {
    let Some(op) = CcOp::from_u32(cond_n_op & 0xf) else {
        return None;
    };
    let flags = calculate_nzcv(op, dep1, dep2, ndep) >> 28;
    Some(Cond::from_bits(cond_n_op >> 4).holds(flags) as u32)
}

/// Saturation indicator for SIMD results: 1 if the saturated and
/// unsaturated 64-bit halves differ.
pub const fn calculate_flag_qc(res_l1: u32, res_l2: u32, res_r1: u32, res_r2: u32) -> u32 {
    (((res_l1 ^ res_r1) | (res_l2 ^ res_r2)) != 0) as u32
}

/// [`Helpers`] implementation exposing the flag functions to the
/// interpreter.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlagHelpers;

impl Helpers for FlagHelpers {
    fn call(&self, name: &str, args: &[u64]) -> Option<u64> {
        let &[a0, a1, a2, a3] = args else {
            return None;
        };
        let [a0, d1, d2, nd] = [a0, a1, a2, a3].map(|v| v as u32);
        let op = || CcOp::from_u32(a0);
        let value = match name {
            HELPER_NZCV => calculate_nzcv(op()?, d1, d2, nd),
            HELPER_FLAG_N => calculate_flag(Flag::N, op()?, d1, d2, nd),
            HELPER_FLAG_Z => calculate_flag(Flag::Z, op()?, d1, d2, nd),
            HELPER_FLAG_C => calculate_flag(Flag::C, op()?, d1, d2, nd),
            HELPER_FLAG_V => calculate_flag(Flag::V, op()?, d1, d2, nd),
            HELPER_CONDITION => calculate_condition(a0, d1, d2, nd)?,
            HELPER_FLAG_QC => calculate_flag_qc(a0, d1, d2, nd),
            _ => return None,
        };
        Some(u64::from(value))
    }
}

fn thunk_call(helper: &'static str, op: Expr) -> Expr {
    Expr::ccall(
        helper,
        IrType::I32,
        vec![
            op,
            Expr::get32(OFFB_CC_DEP1),
            Expr::get32(OFFB_CC_DEP2),
            Expr::get32(OFFB_CC_NDEP),
        ],
    )
}

/// Current value (0 or 1) of one flag, computed from the thunk.
pub fn read_flag(flag: Flag) -> Expr {
    thunk_call(flag.helper(), Expr::get32(OFFB_CC_OP))
}

/// Current NZCV in bits 31:28.
pub fn read_nzcv() -> Expr {
    thunk_call(HELPER_NZCV, Expr::get32(OFFB_CC_OP))
}

/// Old carry, bound to a temporary.
pub fn old_c(ctx: &mut DecodeContext<'_>) -> Expr {
    Expr::tmp(ctx.bind(read_flag(Flag::C)))
}

/// Old overflow, bound to a temporary.
pub fn old_v(ctx: &mut DecodeContext<'_>) -> Expr {
    Expr::tmp(ctx.bind(read_flag(Flag::V)))
}

/// `(oldC << 1) | oldV`, the `ndep` of the multiply tags.
pub fn old_c_v(ctx: &mut DecodeContext<'_>) -> Expr {
    let c = read_flag(Flag::C);
    let v = read_flag(Flag::V);
    Expr::tmp(ctx.bind(Expr::or32(Expr::shl32(c, 1), v)))
}

/// Guard for condition `cond`; `Always` for AL without touching the thunk.
pub fn condition(ctx: &mut DecodeContext<'_>, cond: Cond) -> Guard {
    if cond.is_always() {
        return Guard::Always;
    }
    let op = Expr::or32(Expr::u32(cond.bits() << 4), Expr::get32(OFFB_CC_OP));
    let word = thunk_call(HELPER_CONDITION, op);
    Guard::When(ctx.bind(Expr::to1(word)))
}

/// Overwrite the thunk under `guard`.
///
/// # Panics
///
/// The operands must be constants or temporaries: a tree reading the old
/// thunk would see it half-overwritten.
pub fn set_flags(
    ctx: &mut DecodeContext<'_>,
    op: CcOp,
    dep1: Expr,
    dep2: Expr,
    ndep: Expr,
    guard: Guard,
) {
    for dep in [&dep1, &dep2, &ndep] {
        assert!(
            matches!(dep, Expr::Const(_) | Expr::RdTmp(_)),
            "flag thunk operand must be an atom: {dep}"
        );
    }
    ctx.put_guarded(OFFB_CC_OP, Expr::u32(op as u32), guard);
    ctx.put_guarded(OFFB_CC_DEP1, dep1, guard);
    ctx.put_guarded(OFFB_CC_DEP2, dep2, guard);
    ctx.put_guarded(OFFB_CC_NDEP, ndep, guard);
}

/// Thunk for a result-only tag.
pub fn set_flags_d1_nd(ctx: &mut DecodeContext<'_>, op: CcOp, dep1: Expr, ndep: Expr, guard: Guard) {
    set_flags(ctx, op, dep1, Expr::u32(0), ndep, guard);
}

/// Thunk for a two-operand tag.
pub fn set_flags_d1_d2(ctx: &mut DecodeContext<'_>, op: CcOp, dep1: Expr, dep2: Expr, guard: Guard) {
    set_flags(ctx, op, dep1, dep2, Expr::u32(0), guard);
}

/// Thunk holding literal NZCV (bits 31:28 of `nzcv`).
pub fn set_flags_copy(ctx: &mut DecodeContext<'_>, nzcv: Expr, guard: Guard) {
    let masked = ctx.atom(Expr::and32(nzcv, Expr::u32(0xf000_0000)));
    set_flags(ctx, CcOp::Copy, masked, Expr::u32(0), Expr::u32(0), guard);
}

/// Logical result: N and Z from `result`, C from the shifter, V unchanged.
pub fn set_flags_logic(ctx: &mut DecodeContext<'_>, result: Expr, carry: Expr, guard: Guard) {
    let v = old_v(ctx);
    set_flags(ctx, CcOp::Logic, result, carry, v, guard);
}

/// OR the SIMD saturation indicator for two 64-bit results (as 32-bit
/// halves) into FPSCR.QC.
pub fn set_fpscr_qc(ctx: &mut DecodeContext<'_>, res_l: [Expr; 2], res_r: [Expr; 2], guard: Guard) {
    let [l1, l2] = res_l;
    let [r1, r2] = res_r;
    let qc = Expr::ccall(HELPER_FLAG_QC, IrType::I32, vec![l1, l2, r1, r2]);
    let fpscr = Expr::or32(Expr::get32(OFFB_FPSCR), Expr::shl32(qc, 27));
    ctx.put_guarded(OFFB_FPSCR, fpscr, guard);
}

fn b2w(e: Expr) -> Expr {
    Expr::from1(e)
}

/// Fold a thunk helper call whose tag is a known constant into direct
/// comparisons; `None` leaves the call in place.
pub fn fold_helper(callee: &str, args: &[Expr]) -> Option<Expr> {
    let [op, d1, d2, nd] = args else {
        return None;
    };
    if let (Some(a), Some(b), Some(c), Some(d)) =
        (op.as_const(), d1.as_const(), d2.as_const(), nd.as_const())
    {
        let value = FlagHelpers.call(callee, &[a, b, c, d])?;
        return Some(Expr::u32(value as u32));
    }
    let raw = op.as_const()? as u32;
    let (d1, d2, nd) = (d1.clone(), d2.clone(), nd.clone());
    match callee {
        HELPER_CONDITION => fold_condition(Cond::from_bits(raw >> 4), CcOp::from_u32(raw & 0xf)?, d1, d2),
        HELPER_FLAG_C => match CcOp::from_u32(raw)? {
            CcOp::Sub => Some(b2w(Expr::cmp_le32u(d2, d1))),
            CcOp::Add => Some(b2w(Expr::cmp_lt32u(Expr::add32(d1.clone(), d2), d1))),
            CcOp::Logic => Some(Expr::and32(d2, Expr::u32(1))),
            CcOp::Copy => Some(Expr::bit32(d1, 29)),
            _ => None,
        },
        HELPER_FLAG_V => match CcOp::from_u32(raw)? {
            CcOp::Logic => Some(Expr::and32(nd, Expr::u32(1))),
            CcOp::Copy => Some(Expr::bit32(d1, 28)),
            _ => None,
        },
        _ => None,
    }
}

fn fold_condition(cond: Cond, op: CcOp, d1: Expr, d2: Expr) -> Option<Expr> {
    if cond.is_always() {
        return Some(Expr::u32(1));
    }
    let zero = Expr::u32(0);
    let folded = match (op, cond) {
        (CcOp::Sub, Cond::Eq) => Expr::cmp_eq32(d1, d2),
        (CcOp::Sub, Cond::Ne) => Expr::cmp_ne32(d1, d2),
        (CcOp::Sub, Cond::Hs) => Expr::cmp_le32u(d2, d1),
        (CcOp::Sub, Cond::Lo) => Expr::cmp_lt32u(d1, d2),
        (CcOp::Sub, Cond::Hi) => Expr::cmp_lt32u(d2, d1),
        (CcOp::Sub, Cond::Ls) => Expr::cmp_le32u(d1, d2),
        (CcOp::Sub, Cond::Ge) => Expr::cmp_le32s(d2, d1),
        (CcOp::Sub, Cond::Lt) => Expr::cmp_lt32s(d1, d2),
        (CcOp::Sub, Cond::Gt) => Expr::cmp_lt32s(d2, d1),
        (CcOp::Sub, Cond::Le) => Expr::cmp_le32s(d1, d2),
        (CcOp::Sub, Cond::Mi) => Expr::cmp_lt32s(Expr::sub32(d1, d2), zero),
        (CcOp::Sub, Cond::Pl) => Expr::cmp_le32s(zero, Expr::sub32(d1, d2)),
        (CcOp::Add, Cond::Eq) => Expr::cmp_eq32(Expr::add32(d1, d2), zero),
        (CcOp::Add, Cond::Ne) => Expr::cmp_ne32(Expr::add32(d1, d2), zero),
        (CcOp::Logic | CcOp::Mul, Cond::Eq) => Expr::cmp_eq32(d1, zero),
        (CcOp::Logic | CcOp::Mul, Cond::Ne) => Expr::cmp_ne32(d1, zero),
        (CcOp::Logic | CcOp::Mul, Cond::Mi) => Expr::cmp_lt32s(d1, zero),
        (CcOp::Logic | CcOp::Mul, Cond::Pl) => Expr::cmp_le32s(zero, d1),
        (CcOp::Logic, Cond::Hs) => Expr::cmp_ne32(Expr::and32(d2, Expr::u32(1)), zero),
        (CcOp::Logic, Cond::Lo) => Expr::cmp_eq32(Expr::and32(d2, Expr::u32(1)), zero),
        (CcOp::Copy, _) => copy_condition(cond, &d1),
        _ => return None,
    };
    Some(b2w(folded))
}

/// Condition over literal NZCV held in bits 31:28 of `word`, as `I1`.
fn copy_condition(cond: Cond, word: &Expr) -> Expr {
    let flag = |f: Flag| Expr::bit32(word.clone(), f.shift() as u8);
    let set = |f: Flag| Expr::cmp_ne32(flag(f), Expr::u32(0));
    let positive = match cond {
        Cond::Eq | Cond::Ne => set(Flag::Z),
        Cond::Hs | Cond::Lo => set(Flag::C),
        Cond::Mi | Cond::Pl => set(Flag::N),
        Cond::Vs | Cond::Vc => set(Flag::V),
        Cond::Hi | Cond::Ls => Expr::and1(set(Flag::C), Expr::not1(set(Flag::Z))),
        Cond::Ge | Cond::Lt => Expr::cmp_eq32(flag(Flag::N), flag(Flag::V)),
        Cond::Gt | Cond::Le => Expr::and1(
            Expr::not1(set(Flag::Z)),
            Expr::cmp_eq32(flag(Flag::N), flag(Flag::V)),
        ),
        Cond::Al | Cond::Nv => Expr::u1(true),
    };
    if cond.bits() & 1 == 1 && !cond.is_always() {
        Expr::not1(positive)
    } else {
        positive
    }
}

#[cfg(test)]
mod tests {
    use armlift_ir::{GuestState, Interp, IrBlock, JumpKind, Memory};
    use proptest::prelude::*;

    use super::*;
    use crate::config::{ArchInfo, LiftOptions};
    use crate::layout::{GUEST_STATE_SIZE, OFFB_R15T, reg_offset};

    fn nzcv_bits(op: CcOp, d1: u32, d2: u32, nd: u32) -> u32 {
        calculate_nzcv(op, d1, d2, nd) >> 28
    }

    /// NZCV in bits 3:0 for `a op b` with carry-in `cin`, from 64-bit
    /// arithmetic.
    fn wide_nzcv(op: CcOp, a: u32, b: u32, cin: u32) -> u32 {
        let (ua, ub, uc) = (u64::from(a), u64::from(b), u64::from(cin));
        let (sa, sb, sc) = (i64::from(a as i32), i64::from(b as i32), i64::from(cin));
        let (res, carry, signed) = match op {
            CcOp::Add => (a.wrapping_add(b), ua + ub > 0xffff_ffff, sa + sb),
            CcOp::Adc => (
                a.wrapping_add(b).wrapping_add(cin),
                ua + ub + uc > 0xffff_ffff,
                sa + sb + sc,
            ),
            CcOp::Sub => (a.wrapping_sub(b), ua >= ub, sa - sb),
            CcOp::Sbb => (
                a.wrapping_sub(b).wrapping_sub(cin ^ 1),
                ua >= ub + (1 - uc),
                sa - sb - (1 - sc),
            ),
            _ => unreachable!("{op:?} is not an arithmetic tag"),
        };
        let n = res >> 31;
        let z = u32::from(res == 0);
        let v = u32::from(signed != i64::from(res as i32));
        (n << 3) | (z << 2) | (u32::from(carry) << 1) | v
    }

    /// Block that sets the thunk from R0, R1 and R2 and reads N, Z, C and V
    /// back into R4..R7.
    fn flags_block(op: CcOp) -> IrBlock {
        let mut block = IrBlock::new();
        let (arch, opts) = (ArchInfo::default(), LiftOptions::default());
        let never = |_: u32| false;
        {
            let mut ctx = DecodeContext::new(&mut block, &arch, &opts, &never, 0x1000, 4);
            let [a, b, c] = [0, 1, 2].map(|r| ctx.read_reg(r));
            set_flags(&mut ctx, op, a, b, c, Guard::Always);
            for (r, flag) in (4..).zip([Flag::N, Flag::Z, Flag::C, Flag::V]) {
                ctx.put_reg(r, read_flag(flag), Guard::Always);
            }
        }
        block.set_next(Expr::u32(0), JumpKind::Boring);
        block
    }

    fn run_flags(block: &IrBlock, a: u32, b: u32, cin: u32) -> u32 {
        let mut st = GuestState::new(GUEST_STATE_SIZE);
        for (r, v) in [(0, a), (1, b), (2, cin)] {
            st.set_u32(reg_offset(r), v).unwrap();
        }
        Interp::new(OFFB_R15T, &FlagHelpers)
            .run(block, &mut st, &mut Memory::new())
            .unwrap();
        (4..8).fold(0, |acc, r| (acc << 1) | st.u32_at(reg_offset(r)).unwrap())
    }

    /// Fold with symbolic operands, then substitute constants and compare.
    fn folded_value(callee: &'static str, op: u32, d1: u32, d2: u32, nd: u32) -> Option<u32> {
        let mut block = IrBlock::new();
        let (t1, t2) = (block.new_temp(IrType::I32), block.new_temp(IrType::I32));
        let args = [Expr::u32(op), Expr::tmp(t1), Expr::tmp(t2), Expr::u32(nd)];
        let folded = fold_helper(callee, &args)?;
        let value = folded.rewrite(&mut |e| match e {
            Expr::RdTmp(t) if t == t1 => Expr::u32(d1),
            Expr::RdTmp(t) if t == t2 => Expr::u32(d2),
            other => other,
        });
        Some(value.as_const().expect("substituted fold is constant") as u32)
    }

    #[test]
    fn test_sub_flags() {
        // 5 - 5
        assert_eq!(nzcv_bits(CcOp::Sub, 5, 5, 0), 0b0110);
        // 3 - 5: negative, borrow
        assert_eq!(nzcv_bits(CcOp::Sub, 3, 5, 0), 0b1000);
        // INT_MIN - 1 overflows
        assert_eq!(nzcv_bits(CcOp::Sub, 0x8000_0000, 1, 0), 0b0011);
    }

    #[test]
    fn test_add_flags() {
        assert_eq!(nzcv_bits(CcOp::Add, 0xffff_ffff, 1, 0), 0b0110);
        assert_eq!(nzcv_bits(CcOp::Add, 0x7fff_ffff, 1, 0), 0b1001);
    }

    #[test]
    fn test_logic_keeps_v_and_takes_shifter_carry() {
        assert_eq!(nzcv_bits(CcOp::Logic, 0, 1, 1), 0b0111);
        assert_eq!(nzcv_bits(CcOp::Logic, 0x8000_0000, 0, 0), 0b1000);
    }

    #[test]
    fn test_mull_uses_both_halves() {
        assert_eq!(nzcv_bits(CcOp::Mull, 0, 0, 0), 0b0100);
        assert_eq!(nzcv_bits(CcOp::Mull, 0, 0x8000_0000, 0b10), 0b1010);
        assert_eq!(nzcv_bits(CcOp::Mull, 1, 0, 0b01), 0b0001);
    }

    #[test]
    fn test_copy_masks_low_bits() {
        assert_eq!(calculate_nzcv(CcOp::Copy, 0xa000_0fff, 0, 0), 0xa000_0000);
    }

    #[test]
    fn test_condition_rejects_bad_tag() {
        assert_eq!(calculate_condition(0x08, 0, 0, 0), None);
        assert_eq!(FlagHelpers.call(HELPER_NZCV, &[9, 0, 0, 0]), None);
        assert_eq!(FlagHelpers.call("nonexistent", &[0, 0, 0, 0]), None);
    }

    #[test]
    fn test_arithmetic_flags_through_ir() {
        let values: Vec<u32> = (0..16).chain([0x7fff_ffff, 0x8000_0000, 0xffff_ffff]).collect();
        for op in [CcOp::Add, CcOp::Sub, CcOp::Adc, CcOp::Sbb] {
            let block = flags_block(op);
            let carries = if matches!(op, CcOp::Adc | CcOp::Sbb) {
                0..2
            } else {
                0..1
            };
            for cin in carries {
                for &a in &values {
                    for &b in &values {
                        assert_eq!(
                            run_flags(&block, a, b, cin),
                            wide_nzcv(op, a, b, cin),
                            "{op:?} {a:#x} {b:#x} cin={cin}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_qc() {
        assert_eq!(calculate_flag_qc(1, 2, 1, 2), 0);
        assert_eq!(calculate_flag_qc(1, 2, 1, 3), 1);
    }

    #[test]
    fn test_fold_always_is_one() {
        let args = [
            Expr::u32((14 << 4) | CcOp::Adc as u32),
            Expr::get32(OFFB_CC_DEP1),
            Expr::u32(0),
            Expr::u32(0),
        ];
        assert_eq!(fold_helper(HELPER_CONDITION, &args), Some(Expr::u32(1)));
    }

    #[test]
    fn test_fold_leaves_unknown_tag() {
        let args = [
            Expr::get32(OFFB_CC_OP),
            Expr::get32(OFFB_CC_DEP1),
            Expr::get32(OFFB_CC_DEP2),
            Expr::get32(OFFB_CC_NDEP),
        ];
        assert_eq!(fold_helper(HELPER_CONDITION, &args), None);
    }

    #[test]
    fn test_fold_all_constant() {
        let args = [
            Expr::u32(CcOp::Sub as u32),
            Expr::u32(3),
            Expr::u32(5),
            Expr::u32(0),
        ];
        assert_eq!(fold_helper(HELPER_NZCV, &args), Some(Expr::u32(0x8000_0000)));
    }

    proptest! {
        #[test]
        fn prop_add_nzcv(a in any::<u32>(), b in any::<u32>()) {
            prop_assert_eq!(nzcv_bits(CcOp::Add, a, b, 0), wide_nzcv(CcOp::Add, a, b, 0));
        }

        #[test]
        fn prop_sub_nzcv(a in any::<u32>(), b in any::<u32>()) {
            prop_assert_eq!(nzcv_bits(CcOp::Sub, a, b, 0), wide_nzcv(CcOp::Sub, a, b, 0));
        }

        #[test]
        fn prop_adc_nzcv(a in any::<u32>(), b in any::<u32>(), cin in 0u32..2) {
            prop_assert_eq!(nzcv_bits(CcOp::Adc, a, b, cin), wide_nzcv(CcOp::Adc, a, b, cin));
        }

        #[test]
        fn prop_sbb_nzcv(a in any::<u32>(), b in any::<u32>(), cin in 0u32..2) {
            prop_assert_eq!(nzcv_bits(CcOp::Sbb, a, b, cin), wide_nzcv(CcOp::Sbb, a, b, cin));
        }

        #[test]
        fn prop_sub_is_sbb_with_carry_set(a in any::<u32>(), b in any::<u32>()) {
            prop_assert_eq!(
                calculate_nzcv(CcOp::Sub, a, b, 0),
                calculate_nzcv(CcOp::Sbb, a, b, 1)
            );
        }

        #[test]
        fn prop_folded_condition_agrees(
            cond in 0u32..15,
            op in prop::sample::select(vec![CcOp::Copy, CcOp::Add, CcOp::Sub, CcOp::Logic, CcOp::Mul]),
            d1 in any::<u32>(),
            d2 in any::<u32>(),
            nd in 0u32..4,
        ) {
            let tag = (cond << 4) | op as u32;
            if let Some(got) = folded_value(HELPER_CONDITION, tag, d1, d2, nd) {
                prop_assert_eq!(Some(got), calculate_condition(tag, d1, d2, nd));
            }
        }

        #[test]
        fn prop_folded_carry_agrees(
            op in prop::sample::select(vec![CcOp::Copy, CcOp::Add, CcOp::Sub, CcOp::Logic]),
            d1 in any::<u32>(),
            d2 in any::<u32>(),
            nd in 0u32..4,
        ) {
            let got = folded_value(HELPER_FLAG_C, op as u32, d1, d2, nd);
            prop_assert_eq!(got, Some(calculate_flag(Flag::C, op, d1, d2, nd)));
        }
    }
}
