// SPDX-License-Identifier: MIT

//! The three scored dimensions (§4.5): technical, strategic, security.

pub mod security;
pub mod strategic;
pub mod technical;

pub use strategic::{ArchitectureRules, NoArchitectureRules};
