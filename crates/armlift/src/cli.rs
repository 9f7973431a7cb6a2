//! CLI definitions and argument types.

use std::path::PathBuf;

use armlift::{ArchInfo, HwCaps, InstrSet, LiftOptions};
use clap::{Args, Parser, Subcommand};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "armlift")]
#[command(about = "ARM32 lifter - decodes A32 and Thumb code into IR")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lift a single instruction and print its IR
    Lift {
        #[command(flatten)]
        target: TargetArgs,

        /// Instruction as hex (8 digits for A32, 4 or 8 for Thumb)
        #[arg(value_name = "HEX", required = true)]
        hex: Vec<String>,
    },
    /// Lift a basic block and print its IR
    Block {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        input: InputArgs,
    },
    /// Lift a basic block and execute it on the reference interpreter
    Run {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        input: InputArgs,

        /// Initial register value, e.g. r1=5 or sp=0x8000 (repeatable)
        #[arg(long = "reg", value_name = "REG=VALUE")]
        regs: Vec<String>,

        /// Initial NZCV as a 4-bit value (N is bit 3)
        #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..16))]
        nzcv: u8,
    },
}

/// Guest CPU and translation options shared by all commands.
#[derive(Args, Clone, Debug)]
pub struct TargetArgs {
    /// Decode as Thumb rather than A32
    #[arg(long)]
    pub thumb: bool,

    /// Address of the first instruction (hex)
    #[arg(long, default_value = "0x1000", value_parser = parse_addr)]
    pub pc: u32,

    /// Architecture version
    #[arg(long, default_value = "7", value_parser = clap::value_parser!(u8).range(5..=8))]
    pub arch: u8,

    /// Guest has VFPv3
    #[arg(long)]
    pub vfp: bool,

    /// Guest has Advanced SIMD (implies VFP)
    #[arg(long)]
    pub neon: bool,

    /// Chase conditional branches in their likely direction
    #[arg(long)]
    pub chase: bool,

    /// Maximum guest instructions per block
    #[arg(long, default_value = "50")]
    pub max_insns: usize,

    /// Print the IR exactly as lifted, without cleanup passes
    #[arg(long)]
    pub no_opt: bool,
}

impl TargetArgs {
    pub const fn iset(&self) -> InstrSet {
        if self.thumb { InstrSet::Thumb } else { InstrSet::A32 }
    }

    /// Start address with the instruction-set bit applied.
    pub const fn guest_pc(&self) -> u32 {
        if self.thumb { self.pc | 1 } else { self.pc & !1 }
    }

    /// Address of the first code byte.
    pub const fn base_addr(&self) -> u32 {
        self.pc & !1
    }

    pub fn arch_info(&self) -> ArchInfo {
        let mut caps = HwCaps::empty();
        if self.vfp || self.neon {
            caps |= HwCaps::VFP | HwCaps::VFP3;
        }
        if self.neon {
            caps |= HwCaps::NEON;
        }
        ArchInfo::new(self.arch, caps)
    }

    pub fn options(&self) -> LiftOptions {
        LiftOptions::default()
            .with_chase_cond(self.chase)
            .with_max_insns(self.max_insns)
            .with_optimize(!self.no_opt)
    }
}

/// Where block code comes from.
#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// Raw little-endian code image
    #[arg(long, value_name = "PATH", conflicts_with = "hex")]
    pub file: Option<PathBuf>,

    /// Instructions as hex (8 digits for A32, 4 or 8 for Thumb)
    #[arg(value_name = "HEX", required_unless_present = "file")]
    pub hex: Vec<String>,
}

fn parse_addr(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid address `{s}`: {e}"))
}
