// SPDX-License-Identifier: MIT

//! Strategic dimension (§4.5): output presence, architecture
//! consistency (an empty extension point), and source complexity.

use std::path::Path;

use serde_json::json;

use hive_core::Dimension;
use hive_store::missing_outputs;

use crate::files::{collect_source_files, line_count};
use crate::issue::{apply_penalties, Issue, Severity};
use crate::report::DimensionReport;

const COMPLEXITY_LINE_THRESHOLD: usize = 300;
const COMPLEXITY_PENALTY_PER_FILE: i64 = 5;
const COMPLEXITY_FLOOR_ISSUE_THRESHOLD: i64 = 70;

/// Project-specific architecture rules. The source stubs this check
/// out entirely; this specification keeps it as a documented
/// extension point with empty defaults (§9 open question).
pub trait ArchitectureRules: Send + Sync {
    fn check(&self, worktree: &Path) -> Vec<Issue>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoArchitectureRules;

impl ArchitectureRules for NoArchitectureRules {
    fn check(&self, _worktree: &Path) -> Vec<Issue> {
        Vec::new()
    }
}

pub fn run(worktree: &Path, outputs: &[String], rules: &dyn ArchitectureRules, seed: Option<u64>) -> DimensionReport {
    let mut issues = Vec::new();

    let absent = missing_outputs(worktree, outputs);
    for output in &absent {
        issues.push(Issue::new(Severity::High, format!("declared output {output:?} is absent")));
    }

    let arch_issues = rules.check(worktree);
    issues.extend(arch_issues);

    let files = collect_source_files(worktree, seed);
    let oversized = files.iter().filter(|f| line_count(f) > COMPLEXITY_LINE_THRESHOLD).count();
    let complexity = 100 - (oversized as i64 * COMPLEXITY_PENALTY_PER_FILE);
    let complexity = complexity.max(0);
    if complexity < COMPLEXITY_FLOOR_ISSUE_THRESHOLD {
        issues.push(Issue::new(
            Severity::Medium,
            format!("complexity score {complexity} is below the floor of {COMPLEXITY_FLOOR_ISSUE_THRESHOLD}"),
        ));
    }

    // Each subcheck contributes an equal share of the base score before
    // issue penalties apply: presence and architecture are pass/fail
    // (100 unless an issue already flagged them), complexity is already
    // a 0..100 score.
    let presence_base = 100;
    let arch_base = 100;
    let base = ((presence_base + arch_base + complexity) as f64 / 3.0).round() as i64;
    let score = apply_penalties(base, &issues);

    DimensionReport {
        dimension: Dimension::Strategic,
        score,
        passed: score >= 80 && absent.is_empty(),
        issues,
        details: json!({
            "missing_outputs": absent,
            "files_scanned": files.len(),
            "oversized_files": oversized,
            "complexity": complexity,
        }),
    }
}

#[cfg(test)]
#[path = "strategic_tests.rs"]
mod tests;
