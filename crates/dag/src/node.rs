// SPDX-License-Identifier: MIT

//! The DAG's view of a cell: scheduling state, priority, duration, and
//! the topological level (§3 `CellNode`).

use hive_core::CellId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ESTIMATED_DURATION_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Pending,
    Ready,
    Running,
    Completed,
    Failed,
    Blocked,
}

hive_core::simple_display! {
    CellState {
        Pending => "pending",
        Ready => "ready",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Blocked => "blocked",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellNode {
    pub id: CellId,
    pub dependencies: Vec<CellId>,
    pub dependents: Vec<CellId>,
    pub priority: i64,
    pub estimated_duration_secs: u64,
    pub level: u32,
    pub state: CellState,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
}

impl CellNode {
    pub fn new(id: CellId, dependencies: Vec<CellId>, priority: i64, estimated_duration_secs: u64) -> Self {
        let estimated_duration_secs = if estimated_duration_secs == 0 {
            DEFAULT_ESTIMATED_DURATION_SECS
        } else {
            estimated_duration_secs
        };
        Self {
            id,
            dependencies,
            dependents: Vec::new(),
            priority,
            estimated_duration_secs,
            level: 0,
            state: CellState::Pending,
            started_at: None,
            completed_at: None,
        }
    }
}
