// SPDX-License-Identifier: MIT

//! The `Cell` entity: identifier, declared inputs/outputs/dependencies,
//! lifecycle status, and an optional bound worktree (§3).

use serde::{Deserialize, Serialize};

use hive_core::CellId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Blocked,
}

hive_core::simple_display! {
    CellStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        Blocked => "blocked",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<CellId>,
    pub status: CellStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Cell {
    pub fn new(
        id: CellId,
        description: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        dependencies: Vec<CellId>,
        now_iso: impl Into<String>,
    ) -> Self {
        let now_iso = now_iso.into();
        Self {
            id,
            description: description.into(),
            inputs,
            outputs,
            dependencies,
            status: CellStatus::Pending,
            worktree_path: None,
            branch: None,
            created_at: now_iso.clone(),
            updated_at: now_iso,
        }
    }

    /// The conventional branch name for a cell that followed no bespoke
    /// naming: `cell/<id>` (§6).
    pub fn default_branch_name(id: &CellId) -> String {
        format!("cell/{id}")
    }
}

#[cfg(test)]
#[path = "cell_tests.rs"]
mod tests;
