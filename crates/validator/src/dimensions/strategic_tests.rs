use super::*;

#[test]
fn passes_when_every_output_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("out.txt"), "done").unwrap();
    let report = run(dir.path(), &["out.txt".to_string()], &NoArchitectureRules, None);
    assert!(report.passed);
    assert!(report.issues.is_empty());
}

#[test]
fn flags_missing_outputs_as_high_severity() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(dir.path(), &["missing.txt".to_string()], &NoArchitectureRules, None);
    assert!(!report.passed);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::High);
}

#[test]
fn glob_outputs_resolve_to_at_least_one_match() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.log"), "x").unwrap();
    let report = run(dir.path(), &["*.log".to_string()], &NoArchitectureRules, None);
    assert!(report.issues.is_empty());
}

#[test]
fn oversized_files_deduct_from_complexity() {
    let dir = tempfile::tempdir().unwrap();
    let big = (0..400).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    std::fs::write(dir.path().join("big.rs"), big).unwrap();
    let report = run(dir.path(), &[], &NoArchitectureRules, None);
    let complexity = report.details.get("complexity").and_then(|v| v.as_i64()).unwrap();
    assert_eq!(complexity, 95);
}

#[test]
fn low_complexity_adds_a_medium_issue() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..7 {
        let big = (0..400).map(|j| format!("line {j}")).collect::<Vec<_>>().join("\n");
        std::fs::write(dir.path().join(format!("big{i}.rs")), big).unwrap();
    }
    let report = run(dir.path(), &[], &NoArchitectureRules, None);
    assert!(report.issues.iter().any(|i| i.severity == Severity::Medium));
}
