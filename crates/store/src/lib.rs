// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-store: the Cell Store (§2, §3) -- per-cell on-disk metadata,
//! context logs, and worktree bindings.

pub mod cell;
pub mod error;
pub mod store;
pub mod worktree;

pub use cell::{Cell, CellStatus};
pub use error::StoreError;
pub use store::{missing_outputs, CellStore};
pub use worktree::{default_worktree_path, GitWorktreeBackend, NoopWorktreeBackend, WorktreeBackend};
