use super::*;
use hive_core::FakeClock;
use std::sync::Arc;
use tempfile::tempdir;

fn store(root: &Path) -> CellStore {
    CellStore::new(
        root.to_path_buf(),
        Arc::new(FakeClock::new(1_700_000_000)),
        None,
        Arc::new(crate::worktree::NoopWorktreeBackend::default()),
    )
}

#[test]
fn create_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    let created = store
        .create_cell(id.clone(), "desc", vec!["src/a.rs".into()], vec!["out/a.txt".into()], vec![])
        .unwrap();
    let fetched = store.get(&id).unwrap();
    assert_eq!(created, fetched);
    assert_eq!(fetched.status, CellStatus::Pending);
}

#[test]
fn create_duplicate_is_an_error() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store.create_cell(id.clone(), "desc", vec![], vec![], vec![]).unwrap();
    assert!(matches!(
        store.create_cell(id, "desc", vec![], vec![], vec![]),
        Err(StoreError::AlreadyExists(_))
    ));
}

#[test]
fn path_traversal_in_inputs_is_rejected() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    let result = store.create_cell(id, "desc", vec!["../escape".into()], vec![], vec![]);
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn update_status_refreshes_timestamp() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store.create_cell(id.clone(), "desc", vec![], vec![], vec![]).unwrap();
    let updated = store.update_status(&id, CellStatus::InProgress, "queen").unwrap();
    assert_eq!(updated.status, CellStatus::InProgress);
}

#[test]
fn verify_outputs_detects_missing_literal_output() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    let cell = store
        .create_cell(id, "desc", vec![], vec!["build/out.bin".into()], vec![])
        .unwrap();
    assert!(matches!(
        store.verify_outputs(&cell),
        Err(StoreError::MissingOutput(_, _))
    ));
}

#[test]
fn verify_outputs_passes_once_literal_output_exists() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    let cell = store
        .create_cell(id, "desc", vec![], vec!["build/out.bin".into()], vec![])
        .unwrap();
    let out_path = dir.path().join("build/out.bin");
    fs::create_dir_all(out_path.parent().unwrap()).unwrap();
    fs::write(&out_path, b"x").unwrap();
    store.verify_outputs(&cell).unwrap();
}

#[test]
fn verify_outputs_matches_glob_pattern() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    let cell = store
        .create_cell(id, "desc", vec![], vec!["dist/*.js".into()], vec![])
        .unwrap();
    fs::create_dir_all(dir.path().join("dist")).unwrap();
    fs::write(dir.path().join("dist/bundle.js"), b"x").unwrap();
    store.verify_outputs(&cell).unwrap();
}

#[test]
fn append_context_writes_newline_delimited_records() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store.create_cell(id.clone(), "desc", vec![], vec![], vec![]).unwrap();
    store.append_context(&id, serde_json::json!({"n": 1})).unwrap();
    store.append_context(&id, serde_json::json!({"n": 2})).unwrap();
    let text = fs::read_to_string(store.context_path(&id)).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn archive_moves_cell_dir_and_leaves_no_residue() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store.create_cell(id.clone(), "desc", vec![], vec![], vec![]).unwrap();
    let dest = store.archive(&id).unwrap();
    assert!(dest.exists());
    assert!(matches!(store.get(&id), Err(StoreError::UnknownCell(_))));
}

#[test]
fn cleanup_removes_worktree_branch_and_dir() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    let id = CellId::parse("cell-a").unwrap();
    store.create_cell(id.clone(), "desc", vec![], vec![], vec![]).unwrap();
    store
        .bind_worktree(&id, dir.path().join("wt"), "cell/cell-a")
        .unwrap();
    store.cleanup(&id).unwrap();
    assert!(matches!(store.get(&id), Err(StoreError::UnknownCell(_))));
}

#[test]
fn list_returns_all_created_cells_sorted_by_id() {
    let dir = tempdir().unwrap();
    let store = store(dir.path());
    store
        .create_cell(CellId::parse("b").unwrap(), "", vec![], vec![], vec![])
        .unwrap();
    store
        .create_cell(CellId::parse("a").unwrap(), "", vec![], vec![], vec![])
        .unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
}
