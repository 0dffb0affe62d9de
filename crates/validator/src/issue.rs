// SPDX-License-Identifier: MIT

//! Issue severities and the per-dimension penalty table (§4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Points subtracted from a dimension's base score per occurrence.
    pub fn penalty(self) -> i64 {
        match self {
            Severity::Critical => 30,
            Severity::High => 20,
            Severity::Medium => 10,
            Severity::Low => 5,
        }
    }
}

hive_core::simple_display! {
    Severity {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Apply every issue's penalty to `base`, clamping to `[0, 100]`.
pub fn apply_penalties(base: i64, issues: &[Issue]) -> u32 {
    let penalized = base - issues.iter().map(|i| i.severity.penalty()).sum::<i64>();
    penalized.clamp(0, 100) as u32
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
