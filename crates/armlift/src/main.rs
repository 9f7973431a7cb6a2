//! armlift CLI - ARM32 lifter

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "armlift=debug,armlift_isa=debug"
    } else if cli.silent {
        "armlift=error,armlift_isa=error"
    } else {
        "armlift=info"
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in default_level.split(',') {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::run_command(&cli);
    std::process::exit(exit_code);
}
