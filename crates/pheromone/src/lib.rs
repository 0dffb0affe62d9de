// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-pheromone: the shared, file-backed, cross-process state and
//! event channel (§4.1).

pub mod bus;
pub mod entry;
pub mod error;
pub mod lock;
pub mod state;

pub use bus::{PheromoneBus, SubscriptionId};
pub use entry::{EntryType, PheromoneEntry, BLOCKER_TTL_SECS, DEFAULT_TTL_SECS};
pub use error::BusError;
pub use state::{
    BlockerEntry, DroneStatus, DroneStatusEntry, DroneType, HiveStatus, PheromoneState,
    QueenStatus, WorkerStatusEntry,
};
