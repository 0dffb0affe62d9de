// SPDX-License-Identifier: MIT

use hive_core::WorkerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no idle worker available within the wait budget")]
    NoIdleWorker,

    #[error("worker {0} is not available for assignment")]
    AssignWhileUnavailable(WorkerId),

    #[error("worker {0} is unknown")]
    UnknownWorker(WorkerId),

    #[error("pool has been stopped")]
    Stopped,

    #[error("io error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing event: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PoolError {
    pub fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
