// SPDX-License-Identifier: MIT

//! `hive cell` -- cell inspection and lifecycle (§3, §6).

use std::path::PathBuf;

use serde_json::json;

use crate::cli::CellCommand;
use crate::output::{emit, OutputFormat};

use super::{parse_cell_id, parse_status, resolve_project_root};

pub fn run(project_root: Option<PathBuf>, format: OutputFormat, command: CellCommand) -> anyhow::Result<()> {
    let project_root = resolve_project_root(project_root)?;
    let queen = hive_queen::Queen::new(&project_root)?;
    let store = queen.store();
    let dag = queen.dag();

    match command {
        CellCommand::List { status, ready } => {
            let mut cells = store.list()?;
            if let Some(status) = status {
                let status = parse_status(&status)?;
                cells.retain(|c| c.status == status);
            }
            if ready {
                let ready_ids: std::collections::HashSet<_> = dag.get_ready_cells().into_iter().collect();
                cells.retain(|c| ready_ids.contains(&c.id));
            }
            emit(format, &cells, |cells| {
                if cells.is_empty() {
                    return "no cells".to_string();
                }
                cells
                    .iter()
                    .map(|c| format!("{:<24} {:<12} deps={}", c.id.as_str(), c.status.to_string(), c.dependencies.len()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        CellCommand::Show { id } => {
            let id = parse_cell_id(&id)?;
            let cell = store.get(&id)?;
            let node = dag.node(&id);
            let value = json!({"cell": cell, "dag_node": node});
            emit(format, &value, |v| serde_json::to_string_pretty(v).unwrap_or_default())
        }
        CellCommand::Cleanup { id, max_age } => {
            let targets = match id {
                Some(id) => vec![parse_cell_id(&id)?],
                None => {
                    let max_age_secs = max_age.map(|h| h * 3600);
                    store
                        .list()?
                        .into_iter()
                        .filter(|c| matches!(c.status, hive_store::CellStatus::Completed | hive_store::CellStatus::Failed))
                        .filter(|c| match max_age_secs {
                            Some(limit) => age_secs(&c.updated_at) >= limit,
                            None => true,
                        })
                        .map(|c| c.id)
                        .collect()
                }
            };
            for id in &targets {
                store.cleanup(id)?;
            }
            println!("cleaned up {} cell(s)", targets.len());
            Ok(())
        }
        CellCommand::Validate { id } => {
            let id = parse_cell_id(&id)?;
            let report = queen.validator().validate_cell(&id, None, None)?;
            emit(format, &report, |r| {
                format!(
                    "{}: consensus_score={} consensus_reached={} ({}/{} threshold)",
                    r.cell_id, r.consensus_score, r.consensus_reached, r.consensus_score, r.threshold
                )
            })
        }
    }
}

/// Seconds since an ISO-8601 timestamp, or 0 if unparseable (treated as
/// "just now" so a malformed timestamp never blocks a cleanup sweep).
fn age_secs(iso: &str) -> u64 {
    chrono::DateTime::parse_from_rfc3339(iso)
        .map(|dt| {
            let now = chrono::Utc::now();
            (now.timestamp() - dt.timestamp()).max(0) as u64
        })
        .unwrap_or(0)
}
