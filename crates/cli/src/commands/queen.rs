// SPDX-License-Identifier: MIT

//! `hive queen` -- scheduler control (§4.4, §6).

use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;

use crate::cli::QueenCommand;
use crate::output::{emit, OutputFormat};

use super::resolve_project_root;

pub fn run(project_root: Option<PathBuf>, format: OutputFormat, command: QueenCommand) -> anyhow::Result<()> {
    let project_root = resolve_project_root(project_root)?;
    let queen = hive_queen::Queen::new(&project_root)?;

    match command {
        QueenCommand::Status => {
            let dag = queen.dag();
            let ready = dag.get_ready_cells().len();
            let nodes = dag.all_nodes();
            let running = nodes.iter().filter(|n| n.state == hive_dag::CellState::Running).count();
            let completed = nodes.iter().filter(|n| n.state == hive_dag::CellState::Completed).count();
            let failed = nodes.iter().filter(|n| n.state == hive_dag::CellState::Failed).count();
            let blocked = nodes.iter().filter(|n| n.state == hive_dag::CellState::Blocked).count();
            let pool = queen.pool();
            let value = json!({
                "phase": queen.phase().to_string(),
                "cells": {"total": nodes.len(), "ready": ready, "running": running, "completed": completed, "failed": failed, "blocked": blocked},
                "workers": {"total": pool.len(), "idle": pool.idle_count(), "queued": pool.queue_len()},
            });
            emit(format, &value, |v| {
                format!(
                    "queen: {}\ncells: {} total, {} ready, {} running, {} completed, {} failed, {} blocked\nworkers: {} total, {} idle, {} queued",
                    v["phase"].as_str().unwrap_or("?"), v["cells"]["total"], v["cells"]["ready"], v["cells"]["running"],
                    v["cells"]["completed"], v["cells"]["failed"], v["cells"]["blocked"],
                    v["workers"]["total"], v["workers"]["idle"], v["workers"]["queued"],
                )
            })
        }
        QueenCommand::Start => {
            queen.start()?;
            println!("queen started");
            Ok(())
        }
        QueenCommand::Stop { timeout_secs } => {
            queen.stop(Duration::from_secs(timeout_secs))?;
            println!("queen stopped");
            Ok(())
        }
        QueenCommand::Dispatch { dry_run } => {
            if dry_run {
                let ready = queen.dag().get_ready_cells();
                let idle = queen.pool().idle_count();
                let value = json!({"would_dispatch": ready.len().min(idle), "ready": ready.len(), "idle_workers": idle});
                emit(format, &value, |v| {
                    format!("would dispatch {} ({} ready, {} idle)", v["would_dispatch"], v["ready"], v["idle_workers"])
                })
            } else {
                let outcome = queen.dispatch()?;
                let value = json!({
                    "dispatched": outcome.dispatched.iter().map(|(w, c)| json!({"worker": w.as_str(), "cell": c.as_str()})).collect::<Vec<_>>(),
                    "remaining_ready": outcome.remaining_ready,
                    "idle_workers": outcome.idle_workers,
                });
                emit(format, &value, |v| {
                    format!(
                        "dispatched {} task(s); {} ready remain, {} worker(s) idle",
                        v["dispatched"].as_array().map(|a| a.len()).unwrap_or(0),
                        v["remaining_ready"],
                        v["idle_workers"],
                    )
                })
            }
        }
        QueenCommand::Monitor { interval, cycles } => {
            queen.start()?;
            let mut n: u64 = 0;
            loop {
                let outcome = queen.dispatch()?;
                println!(
                    "cycle {n}: dispatched {}, {} ready remain, {} idle",
                    outcome.dispatched.len(),
                    outcome.remaining_ready,
                    outcome.idle_workers
                );
                n += 1;
                if cycles.is_some_and(|max| n >= max) {
                    break;
                }
                std::thread::sleep(Duration::from_secs(interval));
            }
            queen.stop(Duration::from_secs(10))?;
            Ok(())
        }
    }
}
