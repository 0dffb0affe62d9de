// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-queen: the Queen scheduler (§4.4) -- dispatches ready cells onto
//! pool workers, launches and awaits their agent processes, drives
//! post-completion consensus validation, and runs the background
//! heartbeat that reconciles pool liveness with the Pheromone Bus.

pub mod command;
pub mod error;
pub mod queen;
pub mod registry;
pub mod state;

pub use error::QueenError;
pub use queen::{DispatchOutcome, Queen, QueenEvent};
pub use state::QueenPhase;
