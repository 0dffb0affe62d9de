// SPDX-License-Identifier: MIT

//! Concrete identifier newtypes and the small value enums shared by
//! every crate: task priority, validator dimension/drone type, and
//! agent platform tag.

use serde::{Deserialize, Serialize};

use crate::define_string_id;
use crate::validate::{validate_id, ValidationError};

define_string_id! {
    /// A cell identifier: `^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$`.
    pub struct CellId;
}

define_string_id! {
    /// A worker identifier, conventionally `worker-<n>`.
    pub struct WorkerId;
}

define_string_id! {
    /// A drone (validator instance) identifier.
    pub struct DroneId;
}

impl CellId {
    /// Construct a `CellId`, validating against the id grammar.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        validate_id(&raw)?;
        Ok(Self(raw))
    }
}

impl WorkerId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        validate_id(&raw)?;
        Ok(Self(raw))
    }

    /// The conventional `worker-<n>` identifier for pool slot `n`.
    pub fn sequential(n: usize) -> Self {
        Self(format!("worker-{n}"))
    }
}

impl DroneId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        validate_id(&raw)?;
        Ok(Self(raw))
    }
}

/// Worker-task scheduling priority. Ordered so that `High > Medium > Low`
/// via the derived `Ord` (declaration order is ascending, so we declare
/// `Low` first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

crate::simple_display! {
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// The external agent platform a worker launches for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Claude,
    Opencode,
    Cursor,
}

crate::simple_display! {
    Platform {
        Claude => "claude",
        Opencode => "opencode",
        Cursor => "cursor",
    }
}

impl std::str::FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(Platform::Claude),
            "opencode" => Ok(Platform::Opencode),
            "cursor" => Ok(Platform::Cursor),
            other => Err(ValidationError::InvalidId(other.to_string())),
        }
    }
}

/// Validator dimension / drone type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Technical,
    Strategic,
    Security,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Technical, Dimension::Strategic, Dimension::Security];

    /// The consensus weight for this dimension (§4.5).
    pub fn weight(self) -> f64 {
        match self {
            Dimension::Technical => 0.40,
            Dimension::Strategic => 0.35,
            Dimension::Security => 0.25,
        }
    }
}

crate::simple_display! {
    Dimension {
        Technical => "technical",
        Strategic => "strategic",
        Security => "security",
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
