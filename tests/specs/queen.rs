//! `hive queen` specs.

use crate::prelude::*;

#[test]
fn status_on_bare_project_reports_idle() {
    let project = Project::empty();
    project
        .hive()
        .args(["queen", "status"])
        .passes()
        .stdout_has("queen: idle");
}

#[test]
fn status_json_reports_cell_counts() {
    let project = Project::empty();
    project.cell("alpha", "pending", &[]);
    project.dag_nodes(
        r#"{"id": "alpha", "dependencies": [], "dependents": [], "priority": 0, "estimated_duration_secs": 60, "level": 0, "state": "pending", "started_at": null, "completed_at": null}"#,
    );

    let assert = project.hive().args(["--format", "json", "queen", "status"]).passes();
    let value = json_stdout(&assert);
    assert_eq!(value["cells"]["total"], 1);
    assert_eq!(value["cells"]["ready"], 1);
}

#[test]
fn dispatch_dry_run_reports_without_binding_a_worker() {
    let project = Project::empty();
    project.cell("alpha", "pending", &[]);
    project.dag_nodes(
        r#"{"id": "alpha", "dependencies": [], "dependents": [], "priority": 0, "estimated_duration_secs": 60, "level": 0, "state": "pending", "started_at": null, "completed_at": null}"#,
    );

    let assert = project
        .hive()
        .args(["--format", "json", "queen", "dispatch", "--dry-run"])
        .passes();
    let value = json_stdout(&assert);
    assert_eq!(value["ready"], 1);
    assert!(value["would_dispatch"].as_u64().unwrap() <= 1);
}

#[test]
fn stop_on_an_unstarted_queen_is_idempotent() {
    let project = Project::empty();
    project.hive().args(["queen", "stop"]).passes().stdout_has("queen stopped");
}
