// SPDX-License-Identifier: MIT

//! `WorkerTask`: the unit of work bound to a worker (§3).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hive_core::{CellId, Platform, Priority};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerTask {
    pub cell_id: CellId,
    pub priority: Priority,
    pub timeout_secs: u64,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    pub created_at: u64,
}

impl WorkerTask {
    pub fn new(cell_id: CellId, priority: Priority, timeout_secs: u64, platform: Platform, created_at: u64) -> Self {
        Self {
            cell_id,
            priority,
            timeout_secs,
            platform,
            worktree_path: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            created_at,
        }
    }

    pub fn with_worktree(mut self, path: PathBuf) -> Self {
        self.worktree_path = Some(path);
        self
    }

    pub fn with_paths(mut self, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }
}
