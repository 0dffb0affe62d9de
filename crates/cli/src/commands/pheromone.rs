// SPDX-License-Identifier: MIT

//! `hive pheromone` -- shared-state inspection (§4.1, §6).

use std::path::PathBuf;

use serde_json::json;

use crate::cli::PheromoneCommand;
use crate::output::{emit, OutputFormat};

use super::resolve_project_root;

pub fn run(project_root: Option<PathBuf>, format: OutputFormat, command: PheromoneCommand) -> anyhow::Result<()> {
    let project_root = resolve_project_root(project_root)?;
    let queen = hive_queen::Queen::new(&project_root)?;
    let bus = queen.bus();

    match command {
        PheromoneCommand::Status => {
            let state = bus.read()?;
            let value = json!({
                "hive_id": state.hive_id,
                "status": state.status,
                "queen": state.queen,
                "workers": state.workers.len(),
                "drones": state.drones.len(),
                "blockers": state.blockers.len(),
            });
            emit(format, &value, |v| {
                format!(
                    "hive {} status={} queen_phase={} workers={} drones={} blockers={}",
                    v["hive_id"].as_str().unwrap_or("?"),
                    v["status"].as_str().unwrap_or("?"),
                    v["queen"]["phase"].as_str().unwrap_or("?"),
                    v["workers"],
                    v["drones"],
                    v["blockers"]
                )
            })
        }
        PheromoneCommand::Worker { list: _, blocked } => {
            let state = bus.read()?;
            let mut workers = state.workers;
            if blocked {
                workers.retain(|w| w.status == "blocked");
            }
            emit(format, &workers, |workers| {
                if workers.is_empty() {
                    return "no workers".to_string();
                }
                workers
                    .iter()
                    .map(|w| format!("{:<12} {:<8} cell={} progress={}%", w.id, w.status, w.cell.clone().unwrap_or_else(|| "-".to_string()), w.progress))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        PheromoneCommand::Consensus => {
            let state = bus.read()?;
            emit(format, &state.drones, |drones| {
                if drones.is_empty() {
                    return "no drones".to_string();
                }
                drones
                    .iter()
                    .map(|d| format!("{:<12} {:?} status={:?} cells={}", d.id, d.kind, d.status, d.assigned_cells.len()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        PheromoneCommand::Trace { limit } => {
            let mut entries = bus.history();
            if entries.len() > limit {
                entries = entries.split_off(entries.len() - limit);
            }
            emit(format, &entries, |entries| {
                if entries.is_empty() {
                    return "no trace entries".to_string();
                }
                entries
                    .iter()
                    .map(|e| format!("[{}] {} from={} target={}", e.timestamp, e.kind, e.source, e.target.clone().unwrap_or_else(|| "*".to_string())))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        PheromoneCommand::Show => {
            let state = bus.read()?;
            emit(format, &state, |s| serde_json::to_string_pretty(s).unwrap_or_default())
        }
        PheromoneCommand::Clear => {
            let removed = bus.decay(now_unix())?;
            println!("decay sweep removed {removed} entr{}", if removed == 1 { "y" } else { "ies" });
            Ok(())
        }
    }
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
