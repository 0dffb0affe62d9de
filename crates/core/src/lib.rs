// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-core: shared identifiers, configuration, clock, and validation
//! primitives used by every other crate in the workspace.

pub mod clock;
pub mod config;
pub mod ids;
pub mod macros;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod time;
pub mod validate;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    CellConfig, DagConfig, DroneConfig, HiveConfig, IsolationMode, PheromoneConfig, QueenConfig,
    SwarmConfig, WorkerPoolConfig,
};
pub use ids::{CellId, Dimension, DroneId, Platform, Priority, WorkerId};
pub use validate::ValidationError;
