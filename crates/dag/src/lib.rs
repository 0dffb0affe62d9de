// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-dag: the Cell DAG (§4.2) -- dependency graph with topological
//! ordering, cycle detection, parallel-layer discovery, critical-path
//! analysis, and live execution-state tracking.

pub mod error;
pub mod graph;
pub mod node;

pub use error::DagError;
pub use graph::{CellDag, DagDocument};
pub use node::{CellNode, CellState, DEFAULT_ESTIMATED_DURATION_SECS};
