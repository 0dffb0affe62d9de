// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("timed out after {waited_ms}ms acquiring lock {path}")]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    #[error("shared state at {path} was unreadable after {attempts} attempts")]
    Corrupt { path: PathBuf, attempts: u32 },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing/deserializing shared state: {0}")]
    Serde(#[from] serde_json::Error),
}

impl BusError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
