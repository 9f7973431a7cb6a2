//! Run command.

use armlift::{Machine, reg_name};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, InputArgs, TargetArgs};

/// Handle the `run` command.
pub fn cmd_run(target: &TargetArgs, input: &InputArgs, regs: &[String], nzcv: u8) -> i32 {
    let Some((code, lifted)) = super::lift(target, input) else {
        return EXIT_FAILURE;
    };

    let mut machine = Machine::new().with_code(&code, target.base_addr());
    if let Err(e) = init_state(&mut machine, regs, nzcv) {
        error!(error = %e, "invalid initial state");
        return EXIT_FAILURE;
    }

    let exit = match machine.run(&lifted) {
        Ok(exit) => exit,
        Err(e) => {
            error!(error = %e, "execution failed");
            return EXIT_FAILURE;
        }
    };
    info!(
        insns = lifted.insns,
        side_exit = exit.side_exit,
        "block executed"
    );

    if let Err(e) = print_state(&machine) {
        error!(error = %e, "failed to read guest state");
        return EXIT_FAILURE;
    }
    println!(
        "Exit: {} to {:#x}{}",
        exit.jk,
        exit.dst,
        if exit.side_exit { " (side exit)" } else { "" }
    );
    EXIT_SUCCESS
}

fn init_state(machine: &mut Machine, regs: &[String], nzcv: u8) -> armlift::Result<()> {
    for assign in regs {
        let (r, v) = armlift::parse_reg_assignment(assign)?;
        machine.set_reg(r, v)?;
    }
    machine.set_nzcv(u32::from(nzcv) << 28)
}

fn print_state(machine: &Machine) -> armlift::Result<()> {
    for row in 0..4u8 {
        let line: Vec<String> = (0..4u8)
            .map(|col| {
                let r = row * 4 + col;
                machine.reg(r).map(|v| format!("{:>3}={v:#010x}", reg_name(r)))
            })
            .collect::<armlift::Result<_>>()?;
        println!("{}", line.join("  "));
    }
    let nzcv = machine.nzcv()?;
    let flag = |bit: u32, c: char| if nzcv & (1 << bit) != 0 { c } else { '-' };
    println!(
        "NZCV: {}{}{}{}",
        flag(31, 'N'),
        flag(30, 'Z'),
        flag(29, 'C'),
        flag(28, 'V')
    );
    Ok(())
}
