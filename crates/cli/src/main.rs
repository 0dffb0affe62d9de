// SPDX-License-Identifier: MIT

//! `hive`: the thin CLI adapter over the orchestrator core (§6). Parses
//! flags, initializes tracing, and dispatches straight into the
//! `hive-queen`/`hive-dag`/`hive-pheromone`/`hive-store`/`hive-validator`
//! library crates -- no scheduling or validation logic lives here.

mod cli;
mod commands;
mod exit_error;
mod output;

use clap::Parser;

use cli::Command;
use exit_error::ExitError;

fn init_tracing() {
    let filter = std::env::var("HIVE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: cli::Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Queen(args) => commands::queen::run(cli.project_root, cli.format, args.command),
        Command::Cell(args) => commands::cell::run(cli.project_root, cli.format, args.command),
        Command::Pheromone(args) => commands::pheromone::run(cli.project_root, cli.format, args.command),
        Command::Config(args) => commands::config::run(cli.project_root, cli.format, args.command),
        Command::Validate(args) => commands::validate::run(cli.format, args),
        Command::Dag(args) => commands::dag::run(cli.project_root, cli.format, args.command),
    }
}

fn main() {
    init_tracing();
    let cli = cli::Cli::parse();
    if let Err(e) = run(cli) {
        let err = ExitError::from(e);
        eprintln!("error: {err}");
        std::process::exit(err.code);
    }
}
