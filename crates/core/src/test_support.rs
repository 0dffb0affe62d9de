// SPDX-License-Identifier: MIT

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for the id grammar and the small value enums.
pub mod strategies {
    use proptest::prelude::*;

    use crate::ids::{Dimension, Platform, Priority};

    /// Strings matching `^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$`, the grammar
    /// shared by `CellId`/`WorkerId`/`DroneId` (§6 "Input validation").
    pub fn arb_id_string() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9_-]{0,20}"
    }

    /// A small DAG-friendly id pool so generated dependency edges collide
    /// often enough to exercise forward references and re-linking.
    pub fn arb_id_from_pool(pool_size: usize) -> impl Strategy<Value = String> {
        (0..pool_size).prop_map(|n| format!("c{n}"))
    }

    pub fn arb_priority() -> impl Strategy<Value = Priority> {
        prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
    }

    pub fn arb_platform() -> impl Strategy<Value = Platform> {
        prop_oneof![Just(Platform::Claude), Just(Platform::Opencode), Just(Platform::Cursor)]
    }

    pub fn arb_dimension() -> impl Strategy<Value = Dimension> {
        prop_oneof![Just(Dimension::Technical), Just(Dimension::Strategic), Just(Dimension::Security)]
    }
}
