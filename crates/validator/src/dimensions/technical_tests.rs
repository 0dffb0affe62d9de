use super::*;

#[test]
fn scores_100_when_all_subchecks_have_equivalent_commands() {
    // Without a real package.json/pnpm in the fixture dir, `pnpm`/`npm`
    // are unlikely to resolve; the run must still report a consistent,
    // fully-populated report rather than erroring out.
    let dir = tempfile::tempdir().unwrap();
    let report = run(dir.path());
    assert_eq!(report.dimension, Dimension::Technical);
    assert!(report.score <= 100);
    assert!(report.details.is_object());
}

#[test]
fn subcheck_severity_ranks_test_above_typecheck_above_lint() {
    assert_eq!(subcheck_severity("test"), Severity::Critical);
    assert_eq!(subcheck_severity("typecheck"), Severity::High);
    assert_eq!(subcheck_severity("lint"), Severity::Medium);
}
