// SPDX-License-Identifier: MIT

//! The `Worker` entity and its state machine (§3, §4.3).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hive_core::WorkerId;

use crate::task::WorkerTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Busy,
    Blocked,
    Error,
    Timeout,
    Stopped,
}

hive_core::simple_display! {
    WorkerState {
        Idle => "idle",
        Busy => "busy",
        Blocked => "blocked",
        Error => "error",
        Timeout => "timeout",
        Stopped => "stopped",
    }
}

impl WorkerState {
    /// Admits `idle`, `error`, `timeout` (§4.3 "Availability predicate").
    pub fn is_available(self) -> bool {
        matches!(self, WorkerState::Idle | WorkerState::Error | WorkerState::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub state: WorkerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<WorkerTask>,
    pub progress: u8,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub last_heartbeat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
}

impl Worker {
    pub fn new(id: WorkerId, now: u64) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            current_task: None,
            progress: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            last_heartbeat: now,
            worktree_path: None,
        }
    }

    /// Invariant (ii): `current_task` is non-null iff `state` is `Busy`
    /// or `Blocked` (a blocked worker stays bound to its cell so it can
    /// be found and unblocked later).
    pub fn invariant_holds(&self) -> bool {
        matches!(self.state, WorkerState::Busy | WorkerState::Blocked) == self.current_task.is_some()
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
