// SPDX-License-Identifier: MIT

//! Cross-validation consensus (§4.5): N independent drone runs with
//! distinct seeds, reduced to a mean/variance verdict.

use hive_core::DroneId;

use crate::report::ValidationReport;

#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationOutcome {
    pub reports: Vec<ValidationReport>,
    pub mean: f64,
    pub variance: f64,
    pub consensus_reached: bool,
}

const CONSENSUS_MEAN_THRESHOLD: f64 = 90.0;
const CONSENSUS_VARIANCE_THRESHOLD: f64 = 100.0;
const ALL_PASSED_OVERRIDE_MEAN: f64 = 95.0;

/// Population mean and variance of each report's `consensus_score`.
fn mean_and_variance(scores: &[f64]) -> (f64, f64) {
    if scores.is_empty() {
        return (0.0, 0.0);
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
    (mean, variance)
}

/// Declare consensus iff `mean >= 90` AND `variance < 100` AND (every
/// drone individually passed OR `mean >= 95`) (§4.5, property 9/S6).
pub fn evaluate(reports: &[ValidationReport]) -> CrossValidationOutcome {
    let scores: Vec<f64> = reports.iter().map(|r| r.consensus_score as f64).collect();
    let (mean, variance) = mean_and_variance(&scores);
    let all_passed = reports.iter().all(|r| r.all_dimensions_passed());
    let consensus_reached =
        mean >= CONSENSUS_MEAN_THRESHOLD && variance < CONSENSUS_VARIANCE_THRESHOLD && (all_passed || mean >= ALL_PASSED_OVERRIDE_MEAN);

    CrossValidationOutcome {
        reports: reports.to_vec(),
        mean,
        variance,
        consensus_reached,
    }
}

/// Deterministic per-drone ids for a cross-validation run of `n`
/// drones using `seeds` (or `1..=n` if absent).
pub fn drone_ids_and_seeds(n: usize, seeds: Option<Vec<u64>>) -> Vec<(DroneId, u64)> {
    let seeds = seeds.unwrap_or_else(|| (1..=n as u64).collect());
    seeds
        .into_iter()
        .take(n)
        .enumerate()
        .filter_map(|(i, seed)| DroneId::parse(format!("drone-{}", i + 1)).ok().map(|id| (id, seed)))
        .collect()
}

#[cfg(test)]
#[path = "consensus_tests.rs"]
mod tests;
