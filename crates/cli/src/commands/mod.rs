// SPDX-License-Identifier: MIT

//! Subcommand implementations. Each module borrows nothing from
//! `cli.rs` beyond its own `*Args`/`*Command` types.

pub mod cell;
pub mod config;
pub mod dag;
pub mod pheromone;
pub mod queen;
pub mod validate;

use std::path::{Path, PathBuf};

/// The project root commands operate against: the explicit
/// `--project-root` flag, or the current directory.
pub fn resolve_project_root(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p),
        None => Ok(std::env::current_dir()?),
    }
}

pub fn parse_cell_id(raw: &str) -> anyhow::Result<hive_core::CellId> {
    hive_core::CellId::parse(raw).map_err(|e| anyhow::anyhow!(e))
}

pub fn parse_status(raw: &str) -> anyhow::Result<hive_store::CellStatus> {
    match raw {
        "pending" => Ok(hive_store::CellStatus::Pending),
        "in_progress" => Ok(hive_store::CellStatus::InProgress),
        "completed" => Ok(hive_store::CellStatus::Completed),
        "failed" => Ok(hive_store::CellStatus::Failed),
        "blocked" => Ok(hive_store::CellStatus::Blocked),
        other => Err(anyhow::anyhow!("unknown cell status {other:?}")),
    }
}

pub(crate) fn trellis_dir(project_root: &Path) -> PathBuf {
    project_root.join(".trellis")
}
