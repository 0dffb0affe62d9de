// SPDX-License-Identifier: MIT

//! Security dimension (§4.5): a fixed set of case-insensitive secret
//! patterns scanned over source files, plus the whitelisted dependency
//! audit command.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use hive_core::Dimension;

use crate::exec::{run_whitelisted, PackageManager, SUBCHECK_TIMEOUT};
use crate::files::collect_source_files;
use crate::issue::{apply_penalties, Issue, Severity};
use crate::report::DimensionReport;

/// Case-insensitive patterns for hardcoded secrets (§4.5). Compiled
/// once and reused across every validation run.
fn secret_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let sources = [
            r#"(?i)password\s*[:=]\s*['"][^'"]+['"]"#,
            r#"(?i)api[_-]?key\s*[:=]\s*['"][^'"]+['"]"#,
            r#"(?i)secret\s*[:=]\s*['"][^'"]+['"]"#,
            r#"(?i)token\s*[:=]\s*['"][^'"]+['"]"#,
            r#"(?i)private[_-]?key\s*[:=]\s*['"][^'"]+['"]"#,
        ];
        sources
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

pub fn run(worktree: &Path, seed: Option<u64>) -> DimensionReport {
    let mut issues = Vec::new();
    let files = collect_source_files(worktree, seed);

    for file in &files {
        let Ok(text) = std::fs::read_to_string(file) else {
            continue;
        };
        for pattern in secret_patterns() {
            if let Some(m) = pattern.find(&text) {
                issues.push(Issue::new(
                    Severity::Critical,
                    format!("possible hardcoded secret in {}: {:?}", file.display(), m.as_str()),
                ));
            }
        }
    }

    let pm = PackageManager::detect(worktree);
    let audit = run_whitelisted(pm.program(), &pm.audit_args(), worktree, SUBCHECK_TIMEOUT);
    let audit_flagged = audit.stdout.to_lowercase().contains("vulnerabilities")
        || audit.stderr.to_lowercase().contains("vulnerabilities");
    if audit_flagged {
        issues.push(Issue::new(Severity::High, "dependency audit reported vulnerabilities"));
    }

    let base = 100;
    let score = apply_penalties(base, &issues);
    let has_critical = issues.iter().any(|i| i.severity == Severity::Critical);

    DimensionReport {
        dimension: Dimension::Security,
        score,
        passed: score >= 80 && !has_critical,
        issues,
        details: json!({
            "files_scanned": files.len(),
            "audit_flagged": audit_flagged,
        }),
    }
}

#[cfg(test)]
#[path = "security_tests.rs"]
mod tests;
