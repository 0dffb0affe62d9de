//! `hive dag` specs.

use crate::prelude::*;

fn seed_diamond(project: &Project) {
    project.dag_nodes(
        r#"
{"id": "a", "dependencies": [], "dependents": ["b", "c"], "priority": 0, "estimated_duration_secs": 10, "level": 0, "state": "pending", "started_at": null, "completed_at": null},
{"id": "b", "dependencies": ["a"], "dependents": ["d"], "priority": 0, "estimated_duration_secs": 20, "level": 1, "state": "pending", "started_at": null, "completed_at": null},
{"id": "c", "dependencies": ["a"], "dependents": ["d"], "priority": 0, "estimated_duration_secs": 30, "level": 1, "state": "pending", "started_at": null, "completed_at": null},
{"id": "d", "dependencies": ["b", "c"], "dependents": [], "priority": 0, "estimated_duration_secs": 10, "level": 2, "state": "pending", "started_at": null, "completed_at": null}
"#,
    );
}

#[test]
fn stats_on_bare_project_reports_zero_nodes() {
    let project = Project::empty();
    let assert = project.hive().args(["--format", "json", "dag", "stats"]).passes();
    let value = json_stdout(&assert);
    assert_eq!(value["nodes"], 0);
}

#[test]
fn layers_groups_the_diamond_into_three_layers() {
    let project = Project::empty();
    seed_diamond(&project);

    let assert = project.hive().args(["--format", "json", "dag", "layers"]).passes();
    let value = json_stdout(&assert);
    let layers = value.as_array().unwrap();
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0].as_array().unwrap().len(), 1);
    assert_eq!(layers[1].as_array().unwrap().len(), 2);
    assert_eq!(layers[2].as_array().unwrap().len(), 1);
}

#[test]
fn critical_picks_the_longer_diamond_branch() {
    let project = Project::empty();
    seed_diamond(&project);

    let assert = project.hive().args(["--format", "json", "dag", "critical"]).passes();
    let value = json_stdout(&assert);
    let path: Vec<&str> = value.as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
    similar_asserts::assert_eq!(path, vec!["a", "c", "d"]);
}

#[test]
fn cycle_reports_none_for_a_dag() {
    let project = Project::empty();
    seed_diamond(&project);
    project.hive().args(["dag", "cycle"]).passes().stdout_has("no cycle");
}

#[test]
fn cycle_detects_a_self_referencing_pair() {
    let project = Project::empty();
    project.dag_nodes(
        r#"
{"id": "a", "dependencies": ["b"], "dependents": ["b"], "priority": 0, "estimated_duration_secs": 10, "level": 0, "state": "pending", "started_at": null, "completed_at": null},
{"id": "b", "dependencies": ["a"], "dependents": ["a"], "priority": 0, "estimated_duration_secs": 10, "level": 0, "state": "pending", "started_at": null, "completed_at": null}
"#,
    );

    project.hive().args(["dag", "cycle"]).fails();
}

#[test]
fn visualize_prints_one_line_per_layer() {
    let project = Project::empty();
    seed_diamond(&project);
    project
        .hive()
        .args(["dag", "visualize"])
        .passes()
        .stdout_has("L0:")
        .stdout_has("L1:")
        .stdout_has("L2:");
}
