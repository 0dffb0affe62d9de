use super::*;
use hive_core::FakeClock;
use hive_store::worktree::NoopWorktreeBackend;
use tempfile::tempdir;

fn runner(root: &std::path::Path) -> (ValidationRunner, Arc<CellStore>) {
    let store = Arc::new(CellStore::new(
        root.to_path_buf(),
        Arc::new(FakeClock::new(1_700_000_000)),
        None,
        Arc::new(NoopWorktreeBackend::default()),
    ));
    let audit_dir = default_audit_dir(root);
    (ValidationRunner::new(store.clone(), audit_dir), store)
}

#[test]
fn validate_cell_writes_an_audit_report_even_on_failure() {
    let dir = tempdir().unwrap();
    let (runner, store) = runner(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store
        .create_cell(id.clone(), "desc", vec![], vec!["out.txt".to_string()], vec![])
        .unwrap();

    let report = runner.validate_cell(&id, None, None).unwrap();
    assert_eq!(report.cell_id, id);
    assert!(!report.consensus_reached);

    let audit_path = default_audit_dir(dir.path()).join(format!("drone-audit-{id}.json"));
    assert!(audit_path.exists());
}

#[test]
fn validate_cell_tags_per_drone_audit_files() {
    let dir = tempdir().unwrap();
    let (runner, store) = runner(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store.create_cell(id.clone(), "desc", vec![], vec![], vec![]).unwrap();

    let drone_id = DroneId::parse("drone-1").unwrap();
    runner.validate_cell(&id, Some(drone_id.clone()), Some(1)).unwrap();

    let audit_path = default_audit_dir(dir.path()).join(format!("drone-audit-{id}-{drone_id}.json"));
    assert!(audit_path.exists());
}

#[test]
fn cross_validate_runs_n_independent_drones() {
    let dir = tempdir().unwrap();
    let (runner, store) = runner(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store.create_cell(id.clone(), "desc", vec![], vec![], vec![]).unwrap();

    let outcome = runner.cross_validate(&id, 3, Some(vec![1, 2, 3])).unwrap();
    assert_eq!(outcome.reports.len(), 3);
}

#[test]
fn default_audit_dir_is_under_trellis() {
    let root = std::path::Path::new("/proj");
    assert_eq!(default_audit_dir(root), std::path::PathBuf::from("/proj/.trellis/hive-audit"));
}
