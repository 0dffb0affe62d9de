// SPDX-License-Identifier: MIT

//! `ValidationRunner`: drives the three dimensions to a weighted
//! consensus score for one cell, and `cross_validate` for the
//! N-drone variant (§4.5).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::instrument;

use hive_core::{CellId, DroneId};
use hive_store::CellStore;

use crate::consensus::{drone_ids_and_seeds, evaluate, CrossValidationOutcome};
use crate::dimensions::{security, strategic, technical, ArchitectureRules, NoArchitectureRules};
use crate::error::ValidatorError;
use crate::report::ValidationReport;

/// Weighted-consensus pass threshold (§4.5).
pub const CONSENSUS_THRESHOLD: u32 = 90;

pub struct ValidationRunner {
    store: Arc<CellStore>,
    audit_dir: PathBuf,
    architecture_rules: Arc<dyn ArchitectureRules>,
}

impl ValidationRunner {
    pub fn new(store: Arc<CellStore>, audit_dir: PathBuf) -> Self {
        Self {
            store,
            audit_dir,
            architecture_rules: Arc::new(NoArchitectureRules),
        }
    }

    pub fn with_architecture_rules(mut self, rules: Arc<dyn ArchitectureRules>) -> Self {
        self.architecture_rules = rules;
        self
    }

    /// Run all three dimensions for `cell_id` and fold them into a
    /// single weighted `ValidationReport`, optionally tagged with a
    /// `drone_id` and seeded for deterministic file sampling.
    #[instrument(skip(self))]
    pub fn validate_cell(
        &self,
        cell_id: &CellId,
        drone_id: Option<DroneId>,
        seed: Option<u64>,
    ) -> Result<ValidationReport, ValidatorError> {
        let cell = self.store.get(cell_id)?;
        let worktree = self.store.output_base(&cell);

        let dimensions = vec![
            technical::run(&worktree),
            strategic::run(&worktree, &cell.outputs, self.architecture_rules.as_ref(), seed),
            security::run(&worktree, seed),
        ];

        let consensus_score = ValidationReport::weighted_score(&dimensions);
        let report = ValidationReport {
            cell_id: cell_id.clone(),
            drone_id,
            dimensions,
            consensus_score,
            consensus_reached: consensus_score >= CONSENSUS_THRESHOLD,
            threshold: CONSENSUS_THRESHOLD,
        };
        self.write_report(&report)?;
        Ok(report)
    }

    /// Run `n` independent validations with distinct seeds and reduce
    /// them to a cross-validation verdict (§4.5, property 9, S6).
    #[instrument(skip(self))]
    pub fn cross_validate(
        &self,
        cell_id: &CellId,
        n: usize,
        seeds: Option<Vec<u64>>,
    ) -> Result<CrossValidationOutcome, ValidatorError> {
        let mut reports = Vec::with_capacity(n);
        for (drone_id, seed) in drone_ids_and_seeds(n, seeds) {
            reports.push(self.validate_cell(cell_id, Some(drone_id), Some(seed))?);
        }
        Ok(evaluate(&reports))
    }

    fn audit_path(&self, report: &ValidationReport) -> PathBuf {
        match &report.drone_id {
            Some(drone_id) => self.audit_dir.join(format!("drone-audit-{}-{}.json", report.cell_id, drone_id)),
            None => self.audit_dir.join(format!("drone-audit-{}.json", report.cell_id)),
        }
    }

    /// Write a per-drone report atomically under the audit directory
    /// (§4.5 "Reports are written atomically per-drone").
    fn write_report(&self, report: &ValidationReport) -> Result<(), ValidatorError> {
        fs::create_dir_all(&self.audit_dir).map_err(|e| ValidatorError::io(self.audit_dir.clone(), e))?;
        let path = self.audit_path(report);
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(report)?;
        fs::write(&tmp_path, &bytes).map_err(|e| ValidatorError::io(tmp_path.clone(), e))?;
        fs::rename(&tmp_path, &path).map_err(|e| ValidatorError::io(path, e))?;
        Ok(())
    }
}

/// Standard audit-directory location under a project's `.trellis/`.
pub fn default_audit_dir(project_root: &Path) -> PathBuf {
    project_root.join(".trellis").join("hive-audit")
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
