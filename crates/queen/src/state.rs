// SPDX-License-Identifier: MIT

//! The Queen's own lifecycle phase, distinct from [`hive_pheromone::QueenStatus`]
//! (the on-disk mirror other processes read).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueenPhase {
    Idle,
    Running,
    Paused,
    Stopped,
}

hive_core::simple_display! {
    QueenPhase {
        Idle => "idle",
        Running => "running",
        Paused => "paused",
        Stopped => "stopped",
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
