// SPDX-License-Identifier: MIT

//! The Validation Report (§3, §4.5).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hive_core::{CellId, Dimension, DroneId};

use crate::issue::Issue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionReport {
    pub dimension: Dimension,
    pub score: u32,
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub details: Value,
}

impl DimensionReport {
    pub fn has_critical_issue(&self) -> bool {
        self.issues.iter().any(|i| i.severity == crate::issue::Severity::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub cell_id: CellId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drone_id: Option<DroneId>,
    pub dimensions: Vec<DimensionReport>,
    pub consensus_score: u32,
    pub consensus_reached: bool,
    pub threshold: u32,
}

impl ValidationReport {
    /// Weighted average of per-dimension scores, rounded down
    /// (`Σ(weight_d × score_d) / Σ(weight_d)`), §4.5.
    pub fn weighted_score(dimensions: &[DimensionReport]) -> u32 {
        let (weighted_sum, weight_sum) = dimensions.iter().fold((0.0, 0.0), |(ws, w), d| {
            let weight = d.dimension.weight();
            (ws + weight * d.score as f64, w + weight)
        });
        if weight_sum <= 0.0 {
            return 0;
        }
        (weighted_sum / weight_sum).floor() as u32
    }

    pub fn dimension(&self, dim: Dimension) -> Option<&DimensionReport> {
        self.dimensions.iter().find(|d| d.dimension == dim)
    }

    pub fn all_dimensions_passed(&self) -> bool {
        self.dimensions.iter().all(|d| d.passed)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
