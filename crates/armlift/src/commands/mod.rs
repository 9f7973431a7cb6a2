//! Command implementations.

mod run;

use armlift::{Expr, IrBlock, LiftRequest, LiftedBlock, Lifter};
use armlift_isa::layout::OFFB_R15T;
use tracing::error;

use crate::cli::{Cli, Commands, EXIT_FAILURE, EXIT_SUCCESS, InputArgs, TargetArgs};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Lift { target, hex } => cmd_lift(target, hex),
        Commands::Block { target, input } => cmd_block(target, input),
        Commands::Run {
            target,
            input,
            regs,
            nzcv,
        } => run::cmd_run(target, input, regs, *nzcv),
    }
}

/// Code bytes from `--file` or the hex arguments.
fn load_code(target: &TargetArgs, input: &InputArgs) -> armlift::Result<Vec<u8>> {
    match &input.file {
        Some(path) => armlift::read_code_file(path, target.iset()),
        None => armlift::parse_hex_code(&input.hex, target.iset()),
    }
}

/// Lift a block per `target`, logging failures.
fn lift(target: &TargetArgs, input: &InputArgs) -> Option<(Vec<u8>, LiftedBlock)> {
    let code = match load_code(target, input) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "failed to load code");
            return None;
        }
    };
    let lifter = Lifter::new(target.arch_info(), target.options());
    match armlift::lift_block_with(&lifter, &code, target.base_addr(), target.guest_pc()) {
        Ok(lifted) => Some((code, lifted)),
        Err(e) => {
            error!(error = %e, "lift failed");
            None
        }
    }
}

fn print_block(lifted: &LiftedBlock) {
    println!("{}", lifted.block);
    let pcs: Vec<String> = lifted.pcs.iter().map(|pc| format!("{pc:#x}")).collect();
    println!("Instructions: {} [{}]", lifted.insns, pcs.join(", "));
    println!("End: {:?}, exit {}", lifted.end, lifted.jumpkind());
}

fn cmd_lift(target: &TargetArgs, hex: &[String]) -> i32 {
    let code = match armlift::parse_hex_code(hex, target.iset()) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "failed to parse instruction");
            return EXIT_FAILURE;
        }
    };
    let lifter = Lifter::new(target.arch_info(), target.options());
    let mut irsb = IrBlock::new();
    let res = lifter.lift_one(&mut irsb, &LiftRequest::new(&code, 0, target.guest_pc()));
    irsb.set_next(Expr::get32(OFFB_R15T), res.jk_stop.unwrap_or_default());
    if target.options().optimize {
        armlift_isa::optimize(&mut irsb);
    }

    println!("{irsb}");
    println!(
        "Result: {:?}, len {}, next {:?}",
        res.status, res.len, res.next
    );
    if let Some(jk) = res.jk_stop {
        println!("Stop: {jk}");
    }
    if let Some(at) = res.continue_at {
        println!("Continue at: {at:#x}");
    }
    if res.is_ok() { EXIT_SUCCESS } else { EXIT_FAILURE }
}

fn cmd_block(target: &TargetArgs, input: &InputArgs) -> i32 {
    let Some((_, lifted)) = lift(target, input) else {
        return EXIT_FAILURE;
    };
    print_block(&lifted);
    EXIT_SUCCESS
}
