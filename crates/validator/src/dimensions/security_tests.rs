use super::*;

#[test]
fn flags_hardcoded_password_as_critical() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.js"), r#"const password = "hunter2";"#).unwrap();
    let report = run(dir.path(), None);
    assert!(report.issues.iter().any(|i| i.severity == Severity::Critical));
    assert!(!report.passed);
}

#[test]
fn clean_source_has_no_critical_issues() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
    let report = run(dir.path(), None);
    assert!(!report.issues.iter().any(|i| i.severity == Severity::Critical));
}

#[test]
fn flags_api_key_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "API_KEY = 'sk-abc123xyz'").unwrap();
    let report = run(dir.path(), None);
    assert!(report.issues.iter().any(|i| i.severity == Severity::Critical));
}
