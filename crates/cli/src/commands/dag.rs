// SPDX-License-Identifier: MIT

//! `hive dag` -- Cell DAG analysis (§4.2, §6).

use std::path::PathBuf;

use serde_json::json;

use crate::cli::DagCommand;
use crate::output::{emit, OutputFormat};

use super::resolve_project_root;

pub fn run(project_root: Option<PathBuf>, format: OutputFormat, command: DagCommand) -> anyhow::Result<()> {
    let project_root = resolve_project_root(project_root)?;
    let queen = hive_queen::Queen::new(&project_root)?;
    let dag = queen.dag();

    match command {
        DagCommand::Stats => {
            let nodes = dag.all_nodes();
            let ready = dag.get_ready_cells().len();
            let value = json!({
                "nodes": nodes.len(),
                "ready": ready,
                "pending": nodes.iter().filter(|n| n.state == hive_dag::CellState::Pending).count(),
                "running": nodes.iter().filter(|n| n.state == hive_dag::CellState::Running).count(),
                "completed": nodes.iter().filter(|n| n.state == hive_dag::CellState::Completed).count(),
                "failed": nodes.iter().filter(|n| n.state == hive_dag::CellState::Failed).count(),
                "blocked": nodes.iter().filter(|n| n.state == hive_dag::CellState::Blocked).count(),
            });
            emit(format, &value, |v| serde_json::to_string_pretty(v).unwrap_or_default())
        }
        DagCommand::Layers => {
            let layers = dag.get_parallel_layers()?;
            emit(format, &layers, |layers| {
                layers
                    .iter()
                    .enumerate()
                    .map(|(i, layer)| format!("layer {i}: {}", layer.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        DagCommand::Critical => {
            let path = dag.get_critical_path()?;
            emit(format, &path, |path| {
                let total_secs: u64 = path.iter().filter_map(|c| dag.node(c)).map(|n| n.estimated_duration_secs).sum();
                format!(
                    "{} (est. {})",
                    path.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" -> "),
                    hive_core::time::format_elapsed_secs(total_secs)
                )
            })
        }
        DagCommand::Visualize => {
            let layers = dag.get_parallel_layers()?;
            for (i, layer) in layers.iter().enumerate() {
                println!("L{i}: {}", layer.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "));
                for id in layer {
                    if let Some(node) = dag.node(id) {
                        for dep in &node.dependencies {
                            println!("  {dep} --> {id}");
                        }
                    }
                }
            }
            Ok(())
        }
        DagCommand::Cycle => match dag.detect_cycle() {
            Some(cycle) => {
                emit(format, &cycle, |cycle| {
                    format!("cycle: {}", cycle.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" -> "))
                })?;
                anyhow::bail!("cycle detected");
            }
            None => {
                println!("no cycle");
                Ok(())
            }
        },
    }
}
