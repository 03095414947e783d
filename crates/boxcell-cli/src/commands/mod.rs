//! CLI command definitions and dispatch.

pub mod run;

use clap::{Parser, Subcommand};

/// boxcell — a minimal container-creation core.
#[derive(Parser, Debug)]
#[command(name = boxcell_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command inside a new container.
    Run(run::RunArgs),
}

/// Dispatches the parsed CLI command to its handler and returns the
/// process exit status.
///
/// # Errors
///
/// Returns an error if the command execution fails before a child
/// status is available.
pub fn execute(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Run(args) => run::execute(args),
    }
}
