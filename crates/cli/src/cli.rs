// SPDX-License-Identifier: MIT

//! Subcommand routing (§6 CLI surface). This crate is a thin adapter:
//! flag parsing and dispatch only, no business logic -- every handler
//! in `commands/` delegates straight into the library crates.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "hive", version, about = "Concurrent multi-agent cell orchestrator")]
pub struct Cli {
    /// Project root containing `.trellis/` (default: current directory).
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    /// Output format for commands that support it.
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Queen scheduler control.
    Queen(QueenArgs),
    /// Cell inspection and lifecycle.
    Cell(CellArgs),
    /// Pheromone bus inspection.
    Pheromone(PheromoneArgs),
    /// Configuration inspection.
    Config(ConfigArgs),
    /// Run the Drone Validator against a task directory directly.
    Validate(ValidateArgs),
    /// Cell DAG analysis.
    Dag(DagArgs),
}

#[derive(Args)]
pub struct QueenArgs {
    #[command(subcommand)]
    pub command: QueenCommand,
}

#[derive(Subcommand)]
pub enum QueenCommand {
    /// Print the scheduler phase, pool counts, and dag inventory.
    Status,
    /// Start the pool and the background heartbeat.
    Start,
    /// Stop the pool, tearing down in-flight agent processes.
    Stop {
        /// Seconds to wait for graceful termination before killing.
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
    /// Bind idle workers to ready cells and launch their agents.
    Dispatch {
        /// Report what would be dispatched without binding anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Repeatedly dispatch and report, on a fixed interval.
    Monitor {
        /// Seconds between dispatch cycles.
        #[arg(long, default_value_t = 5)]
        interval: u64,
        /// Stop after this many cycles (default: run until interrupted).
        #[arg(long)]
        cycles: Option<u64>,
    },
}

#[derive(Args)]
pub struct CellArgs {
    #[command(subcommand)]
    pub command: CellCommand,
}

#[derive(Subcommand)]
pub enum CellCommand {
    /// List cells, optionally filtered.
    List {
        /// Only cells with this status (pending/in_progress/completed/failed/blocked).
        #[arg(long)]
        status: Option<String>,
        /// Only cells whose dependencies are all completed and are pending.
        #[arg(long)]
        ready: bool,
    },
    /// Show one cell's metadata.
    Show { id: String },
    /// Remove a cell's bound worktree/branch and on-disk metadata.
    Cleanup {
        /// Cell to clean up; omit with `--max-age` to sweep completed/failed cells.
        id: Option<String>,
        /// Only cells whose `updated_at` is older than this many hours.
        #[arg(long)]
        max_age: Option<u64>,
    },
    /// Run the drone validator against a stored cell's bound worktree.
    Validate { id: String },
}

#[derive(Args)]
pub struct PheromoneArgs {
    #[command(subcommand)]
    pub command: PheromoneCommand,
}

#[derive(Subcommand)]
pub enum PheromoneCommand {
    /// Print hive status, queen phase, and counts.
    Status,
    /// Print worker status entries from the shared state.
    Worker {
        #[arg(long)]
        list: bool,
        #[arg(long)]
        blocked: bool,
    },
    /// Print drone status entries from the shared state.
    Consensus,
    /// Print the in-memory event history, most recent last.
    Trace {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Print the full shared-state document.
    Show,
    /// Run a decay sweep now.
    Clear,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (file + defaults + env overrides).
    Show,
    /// Validate the configuration without starting anything.
    Validate,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Directory to validate (a worktree or any source tree).
    pub task_dir: PathBuf,
    /// Restrict to a subset of dimensions (technical, strategic, security).
    #[arg(long, value_delimiter = ',')]
    pub dimensions: Vec<String>,
    /// Run N independent drones and require cross-validation consensus.
    #[arg(long)]
    pub cross_validate: bool,
    /// Number of drones for `--cross-validate` (default 3).
    #[arg(long, default_value_t = 3)]
    pub drones: usize,
    /// Retry up to this many times while consensus isn't reached.
    #[arg(long, default_value_t = 1)]
    pub max_retries: u32,
}

#[derive(Args)]
pub struct DagArgs {
    #[command(subcommand)]
    pub command: DagCommand,
}

#[derive(Subcommand)]
pub enum DagCommand {
    /// Node/edge counts, layer count, and readiness counts.
    Stats,
    /// Parallel layers, each sorted by descending priority.
    Layers,
    /// The longest-duration path from a source to a sink.
    Critical,
    /// A line-oriented rendering of layers and edges.
    Visualize,
    /// Report a cycle witness if one exists.
    Cycle,
}
