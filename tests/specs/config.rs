//! `hive config` specs.

use crate::prelude::*;

#[test]
fn show_on_bare_project_prints_defaults() {
    let project = Project::empty();
    project
        .hive()
        .args(["config", "show"])
        .passes()
        .stdout_has("log_level");
}

#[test]
fn show_json_round_trips_worker_count() {
    let project = Project::empty();
    project.config(
        r#"
worker_count: 6
"#,
    );
    let assert = project.hive().args(["--format", "json", "config", "show"]).passes();
    let value = json_stdout(&assert);
    assert_eq!(value["worker_count"], 6);
}

#[test]
fn validate_reports_success_on_defaults() {
    let project = Project::empty();
    project.hive().args(["config", "validate"]).passes().stdout_has("valid");
}

#[test]
fn validate_fails_when_worker_count_out_of_range() {
    let project = Project::empty();
    project.config(
        r#"
worker_count: 999
"#,
    );
    project.hive().args(["config", "validate"]).fails();
}
