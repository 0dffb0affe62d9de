// SPDX-License-Identifier: MIT

use thiserror::Error;

use hive_core::CellId;

#[derive(Debug, Error)]
pub enum QueenError {
    #[error("dag error: {0}")]
    Dag(#[from] hive_dag::DagError),

    #[error("pool error: {0}")]
    Pool(#[from] hive_pool::PoolError),

    #[error("store error: {0}")]
    Store(#[from] hive_store::StoreError),

    #[error("pheromone bus error: {0}")]
    Bus(#[from] hive_pheromone::BusError),

    #[error("validator error: {0}")]
    Validator(#[from] hive_validator::ValidatorError),

    #[error("config error: {0}")]
    Config(#[from] hive_core::config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cell {0} is not blocked")]
    NotBlocked(CellId),

    #[error("no ready cells and no idle workers")]
    NothingToDispatch,

    #[error("queen is not running")]
    NotRunning,

    #[error("queen has already been started")]
    AlreadyRunning,
}
