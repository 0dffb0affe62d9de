//! `hive cell` specs.

use crate::prelude::*;

#[test]
fn list_on_bare_project_reports_no_cells() {
    let project = Project::empty();
    project.hive().args(["cell", "list"]).passes().stdout_has("no cells");
}

#[test]
fn list_shows_registered_cells() {
    let project = Project::empty();
    project.cell("alpha", "pending", &[]);
    project.cell("beta", "completed", &[]);

    let assert = project.hive().args(["--format", "json", "cell", "list"]).passes();
    let value = json_stdout(&assert);
    let ids: Vec<&str> = value.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"alpha"));
    assert!(ids.contains(&"beta"));
}

#[test]
fn list_filters_by_status() {
    let project = Project::empty();
    project.cell("alpha", "pending", &[]);
    project.cell("beta", "completed", &[]);

    let assert = project
        .hive()
        .args(["--format", "json", "cell", "list", "--status", "completed"])
        .passes();
    let value = json_stdout(&assert);
    let cells = value.as_array().unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0]["id"], "beta");
}

#[test]
fn list_ready_excludes_cells_with_incomplete_dependencies() {
    let project = Project::empty();
    project.cell("alpha", "pending", &[]);
    project.cell("beta", "pending", &["alpha"]);
    project.dag_nodes(
        r#"
{"id": "alpha", "dependencies": [], "dependents": ["beta"], "priority": 0, "estimated_duration_secs": 60, "level": 0, "state": "pending", "started_at": null, "completed_at": null},
{"id": "beta", "dependencies": ["alpha"], "dependents": [], "priority": 0, "estimated_duration_secs": 60, "level": 1, "state": "pending", "started_at": null, "completed_at": null}
"#,
    );

    let assert = project
        .hive()
        .args(["--format", "json", "cell", "list", "--ready"])
        .passes();
    let value = json_stdout(&assert);
    let ids: Vec<&str> = value.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["alpha"]);
}

#[test]
fn show_prints_cell_metadata() {
    let project = Project::empty();
    project.cell("alpha", "pending", &[]);

    project
        .hive()
        .args(["cell", "show", "alpha"])
        .passes()
        .stdout_has("alpha");
}

#[test]
fn show_unknown_cell_fails() {
    let project = Project::empty();
    project.hive().args(["cell", "show", "nonexistent"]).fails();
}

#[test]
fn cleanup_single_cell_removes_its_directory() {
    let project = Project::empty();
    project.cell("alpha", "completed", &[]);
    assert!(project.trellis_dir().join("cells/alpha/cell.json").exists());

    project.hive().args(["cell", "cleanup", "alpha"]).passes().stdout_has("cleaned up 1");

    assert!(!project.trellis_dir().join("cells/alpha").exists());
}

#[test]
fn cleanup_sweep_skips_pending_cells() {
    let project = Project::empty();
    project.cell("alpha", "pending", &[]);
    project.cell("beta", "failed", &[]);

    project.hive().args(["cell", "cleanup"]).passes().stdout_has("cleaned up 1");

    assert!(project.trellis_dir().join("cells/alpha/cell.json").exists());
    assert!(!project.trellis_dir().join("cells/beta").exists());
}
