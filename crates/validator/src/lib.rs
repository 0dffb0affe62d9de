// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hive-validator: the Drone Validator (§4.5) -- multi-dimensional
//! weighted-consensus scoring run by N independent judges with
//! distinct random seeds.

pub mod consensus;
pub mod dimensions;
pub mod error;
pub mod exec;
pub mod files;
pub mod issue;
pub mod report;
pub mod runner;

pub use consensus::{drone_ids_and_seeds, evaluate, CrossValidationOutcome};
pub use dimensions::{ArchitectureRules, NoArchitectureRules};
pub use error::ValidatorError;
pub use issue::{apply_penalties, Issue, Severity};
pub use report::{DimensionReport, ValidationReport};
pub use runner::{default_audit_dir, ValidationRunner, CONSENSUS_THRESHOLD};
