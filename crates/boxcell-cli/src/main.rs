//! # bxc — boxcell CLI
//!
//! Runs a single command inside an isolated container built from a
//! local image archive.

mod commands;

use clap::Parser;

use crate::commands::Cli;

#[allow(clippy::print_stderr)]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match commands::execute(cli) {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
