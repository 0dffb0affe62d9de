// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use hive_core::{CellId, ValidationError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cell {0} already exists")]
    AlreadyExists(CellId),

    #[error("cell {0} is unknown")]
    UnknownCell(CellId),

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing/deserializing cell metadata: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cell {0} declares output {1:?} which is not present on disk")]
    MissingOutput(CellId, String),

    #[error("external command {command:?} failed: {detail}")]
    Command { command: String, detail: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
