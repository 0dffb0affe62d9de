// SPDX-License-Identifier: MIT

use hive_core::CellId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DagError {
    #[error("cell {0} already exists")]
    DuplicateCell(CellId),

    #[error("cell {0} is unknown")]
    UnknownCell(CellId),

    #[error("dependency graph contains a cycle: {}", path.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" -> "))]
    CycleDetected { path: Vec<CellId> },

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

impl From<std::io::Error> for DagError {
    fn from(e: std::io::Error) -> Self {
        DagError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for DagError {
    fn from(e: serde_json::Error) -> Self {
        DagError::Serde(e.to_string())
    }
}
