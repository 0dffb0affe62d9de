// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-pool: the Worker Pool (§4.3) -- bounded worker slots, a
//! priority task queue, atomic assignment, heartbeat-based liveness,
//! and process-tree teardown.

pub mod error;
pub mod pool;
pub mod process;
pub mod queue;
pub mod task;
pub mod worker;

pub use error::PoolError;
pub use pool::WorkerPool;
pub use process::{spawn, ChildProcessHandle, ProcessHandle};
pub use queue::PriorityQueue;
pub use task::WorkerTask;
pub use worker::{Worker, WorkerState};
