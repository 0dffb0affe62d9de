//! `hive pheromone` specs.

use crate::prelude::*;

#[test]
fn status_on_bare_project_creates_shared_state() {
    let project = Project::empty();
    project
        .hive()
        .args(["pheromone", "status"])
        .passes()
        .stdout_has("status=inactive");

    assert!(project.trellis_dir().join("pheromone.json").exists());
}

#[test]
fn worker_lists_no_workers_on_a_fresh_hive() {
    let project = Project::empty();
    project.hive().args(["pheromone", "worker"]).passes().stdout_has("no workers");
}

#[test]
fn consensus_lists_no_drones_on_a_fresh_hive() {
    let project = Project::empty();
    project
        .hive()
        .args(["pheromone", "consensus"])
        .passes()
        .stdout_has("no drones");
}

#[test]
fn trace_is_empty_on_a_fresh_hive() {
    let project = Project::empty();
    project
        .hive()
        .args(["pheromone", "trace"])
        .passes()
        .stdout_has("no trace entries");
}

#[test]
fn show_prints_the_full_document_as_json() {
    let project = Project::empty();
    let assert = project.hive().args(["pheromone", "show"]).passes();
    let _ = json_stdout(&assert);
}

#[test]
fn clear_reports_a_decay_sweep() {
    let project = Project::empty();
    project
        .hive()
        .args(["pheromone", "clear"])
        .passes()
        .stdout_has("decay sweep removed");
}
