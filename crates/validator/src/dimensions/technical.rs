// SPDX-License-Identifier: MIT

//! Technical dimension (§4.5): lint, type-check, and test subchecks,
//! each run via a fixed whitelisted command with a 120s timeout.

use std::path::Path;

use serde_json::json;

use hive_core::Dimension;

use crate::exec::{run_whitelisted, PackageManager, SUBCHECK_TIMEOUT};
use crate::issue::{apply_penalties, Issue, Severity};
use crate::report::DimensionReport;

/// A failed subcheck's severity: type errors and test failures gate a
/// merge more than a lint nit, so they're weighted accordingly (§4.5
/// "severity penalties apply"; resolved in DESIGN.md -- the spec
/// specifies the base-score arithmetic but not per-subcheck severity).
fn subcheck_severity(name: &str) -> Severity {
    match name {
        "test" => Severity::Critical,
        "typecheck" => Severity::High,
        _ => Severity::Medium,
    }
}

pub fn run(worktree: &Path) -> DimensionReport {
    let pm = PackageManager::detect(worktree);
    let subchecks: [(&str, Vec<&str>); 3] = [
        ("lint", pm.lint_args()),
        ("typecheck", pm.typecheck_args()),
        ("test", pm.test_args()),
    ];

    let mut passed_count = 0u32;
    let mut issues = Vec::new();
    let mut details = serde_json::Map::new();

    for (name, args) in &subchecks {
        let result = run_whitelisted(pm.program(), args, worktree, SUBCHECK_TIMEOUT);
        if result.passed {
            passed_count += 1;
        } else {
            issues.push(Issue::new(
                subcheck_severity(name),
                format!("{name} failed{}", if result.timed_out { " (timed out)" } else { "" }),
            ));
        }
        details.insert(
            (*name).to_string(),
            json!({"passed": result.passed, "timed_out": result.timed_out}),
        );
    }

    let base = (100.0 * (passed_count as f64 / subchecks.len() as f64)).round() as i64;
    let score = apply_penalties(base, &issues);

    DimensionReport {
        dimension: Dimension::Technical,
        score,
        passed: passed_count == subchecks.len() as u32,
        issues,
        details: serde_json::Value::Object(details),
    }
}

#[cfg(test)]
#[path = "technical_tests.rs"]
mod tests;
