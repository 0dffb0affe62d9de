// SPDX-License-Identifier: MIT

//! `HiveConfig`: the deserialized form of `hive-config.yaml`, with
//! `Default` impls matching every default in the external-interfaces
//! table and an environment-variable override pass applied after load.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    Strict,
    Relaxed,
}

impl Default for IsolationMode {
    fn default() -> Self {
        IsolationMode::Strict
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub worker_count_min: u32,
    pub worker_count_max: u32,
    pub worker_count_default: u32,
    pub drone_ratio: f64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            worker_count_min: 2,
            worker_count_max: 5,
            worker_count_default: 3,
            drone_ratio: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PheromoneConfig {
    pub file: PathBuf,
    pub timeout_secs: u64,
    pub heartbeat_interval_secs: u64,
}

impl Default for PheromoneConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(".trellis/pheromone.json"),
            timeout_secs: 300,
            heartbeat_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    pub consensus_threshold: u32,
    pub max_iterations: u32,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: 90,
            max_iterations: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    pub isolation: IsolationMode,
    pub worktree_base: PathBuf,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            isolation: IsolationMode::default(),
            worktree_base: PathBuf::from("../trellis-worktrees"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueenConfig {
    pub heartbeat_interval_secs: u64,
    pub max_concurrent_cells: u32,
    pub timeout_minutes: u32,
}

impl Default for QueenConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            max_concurrent_cells: 5,
            timeout_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    pub min_workers: u32,
    pub max_workers: u32,
    pub default_workers: u32,
    pub task_stealing: bool,
    pub worker_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 2,
            max_workers: 5,
            default_workers: 3,
            task_stealing: true,
            worker_timeout_secs: 300,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagConfig {
    pub enable_cycle_detection: bool,
    pub parallel_layer_limit: u32,
    pub enable_critical_path: bool,
    pub persist_state: bool,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            enable_cycle_detection: true,
            parallel_layer_limit: 5,
            enable_critical_path: true,
            persist_state: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    pub worker_count: u32,
    pub swarm: SwarmConfig,
    pub pheromone: PheromoneConfig,
    pub drone: DroneConfig,
    pub cell: CellConfig,
    pub queen: QueenConfig,
    pub worker_pool: WorkerPoolConfig,
    pub dag: DagConfig,
    /// Tracing verbosity for the CLI entry point. Not part of the
    /// distilled schema; added as the ambient-stack log-level setting
    /// exposed via `HIVE_LOG_LEVEL`.
    pub log_level: String,
}

impl Default for HiveConfig {
    fn default() -> Self {
        let swarm = SwarmConfig::default();
        Self {
            worker_count: swarm.worker_count_default,
            swarm,
            pheromone: PheromoneConfig::default(),
            drone: DroneConfig::default(),
            cell: CellConfig::default(),
            queen: QueenConfig::default(),
            worker_pool: WorkerPoolConfig::default(),
            dag: DagConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl HiveConfig {
    /// Load `<project_root>/.trellis/hive-config.yaml` if present,
    /// merging over the built-in defaults; applies environment
    /// overrides; validates; returns every validation failure at once.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(".trellis").join("hive-config.yaml");
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            Self::default()
        };
        config.merge_env();
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        Ok(config)
    }

    /// Apply the handful of environment-variable overrides operators
    /// need without editing the config file.
    pub fn merge_env(&mut self) {
        if let Ok(level) = env::var("HIVE_LOG_LEVEL") {
            self.log_level = level;
        }
        // HIVE_PROJECT_ROOT is consumed by the CLI entry point before
        // HiveConfig::load is even called; it has no field here.
    }

    /// Validate every field against its declared range, collecting all
    /// failures rather than stopping at the first (matches `config
    /// validate`'s "don't stop at first error" texture).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.worker_count < self.worker_pool.min_workers
            || self.worker_count > self.worker_pool.max_workers
        {
            errors.push(format!(
                "worker_count ({}) must be within worker_pool.{{min_workers={}, max_workers={}}}",
                self.worker_count, self.worker_pool.min_workers, self.worker_pool.max_workers
            ));
        }
        if !(0.0..=1.0).contains(&self.swarm.drone_ratio) {
            errors.push(format!(
                "swarm.drone_ratio ({}) must be within [0.0, 1.0]",
                self.swarm.drone_ratio
            ));
        }
        if self.swarm.worker_count_min > self.swarm.worker_count_max {
            errors.push(format!(
                "swarm.worker_count.min ({}) must be <= swarm.worker_count.max ({})",
                self.swarm.worker_count_min, self.swarm.worker_count_max
            ));
        }
        if self.drone.consensus_threshold > 100 {
            errors.push(format!(
                "drone.consensus_threshold ({}) must be within [0, 100]",
                self.drone.consensus_threshold
            ));
        }
        if self.worker_pool.min_workers > self.worker_pool.max_workers {
            errors.push(format!(
                "worker_pool.min_workers ({}) must be <= worker_pool.max_workers ({})",
                self.worker_pool.min_workers, self.worker_pool.max_workers
            ));
        }
        if self.worker_pool.default_workers < self.worker_pool.min_workers
            || self.worker_pool.default_workers > self.worker_pool.max_workers
        {
            errors.push(format!(
                "worker_pool.default_workers ({}) must be within [{}, {}]",
                self.worker_pool.default_workers,
                self.worker_pool.min_workers,
                self.worker_pool.max_workers
            ));
        }
        if self.dag.parallel_layer_limit == 0 {
            errors.push("dag.parallel_layer_limit must be >= 1".to_string());
        }

        errors
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
