// SPDX-License-Identifier: MIT

//! The shared-state document persisted at `pheromone.json` (§6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::PheromoneEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiveStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueenStatus {
    pub phase: String,
    pub last_heartbeat: u64,
}

impl Default for QueenStatus {
    fn default() -> Self {
        Self {
            phase: "idle".to_string(),
            last_heartbeat: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatusEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    pub status: String,
    pub progress: u8,
    pub last_update: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneType {
    Technical,
    Strategic,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneStatus {
    Waiting,
    Validating,
    Consensus,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneStatusEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DroneType,
    pub status: DroneStatus,
    pub assigned_cells: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerEntry {
    pub cell_id: String,
    pub reason: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PheromoneState {
    pub hive_id: String,
    pub status: HiveStatus,
    pub queen: QueenStatus,
    #[serde(default)]
    pub workers: Vec<WorkerStatusEntry>,
    #[serde(default)]
    pub drones: Vec<DroneStatusEntry>,
    #[serde(default)]
    pub pheromones: Vec<PheromoneEntry>,
    #[serde(default)]
    pub blockers: Vec<BlockerEntry>,
}

impl PheromoneState {
    pub fn empty(hive_id: impl Into<String>) -> Self {
        Self {
            hive_id: hive_id.into(),
            status: HiveStatus::Inactive,
            queen: QueenStatus::default(),
            workers: Vec::new(),
            drones: Vec::new(),
            pheromones: Vec::new(),
            blockers: Vec::new(),
        }
    }

    pub fn upsert_worker(&mut self, entry: WorkerStatusEntry) {
        if let Some(existing) = self.workers.iter_mut().find(|w| w.id == entry.id) {
            *existing = entry;
        } else {
            self.workers.push(entry);
        }
    }

    pub fn upsert_drone(&mut self, entry: DroneStatusEntry) {
        if let Some(existing) = self.drones.iter_mut().find(|d| d.id == entry.id) {
            *existing = entry;
        } else {
            self.drones.push(entry);
        }
    }

    pub fn push_blocker(&mut self, cell_id: impl Into<String>, reason: impl Into<String>, now: u64) {
        self.blockers.push(BlockerEntry {
            cell_id: cell_id.into(),
            reason: reason.into(),
            timestamp: now,
        });
    }

    pub fn clear_blockers_for(&mut self, cell_id: &str) {
        self.blockers.retain(|b| b.cell_id != cell_id);
    }
}

/// Opaque payload helper so callers don't need to import `serde_json`
/// just to build `data` for `emit`.
pub fn data(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
