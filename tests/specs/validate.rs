//! `hive validate <task-dir>` specs: the standalone ad-hoc validator,
//! independent of any registered cell.

use crate::prelude::*;

#[test]
fn validate_reports_all_three_dimensions_by_default() {
    let project = Project::empty();
    let target = project.path().join("target-dir");
    std::fs::create_dir_all(&target).expect("create validate target");

    let assert = project
        .hive()
        .args(["--format", "json", "validate", target.to_str().unwrap()])
        .output()
        .expect("run hive validate");
    let stdout = String::from_utf8_lossy(&assert.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("validate prints json report");

    let dims: Vec<&str> = value["dimensions"]
        .as_array()
        .expect("dimensions array")
        .iter()
        .map(|d| d["dimension"].as_str().unwrap())
        .collect();
    assert!(dims.contains(&"technical"));
    assert!(dims.contains(&"strategic"));
    assert!(dims.contains(&"security"));
}

#[test]
fn validate_restricts_to_requested_dimensions() {
    let project = Project::empty();
    let target = project.path().join("target-dir");
    std::fs::create_dir_all(&target).expect("create validate target");

    let assert = project
        .hive()
        .args([
            "--format",
            "json",
            "validate",
            target.to_str().unwrap(),
            "--dimensions",
            "security",
        ])
        .output()
        .expect("run hive validate");
    let stdout = String::from_utf8_lossy(&assert.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("validate prints json report");

    let dims = value["dimensions"].as_array().expect("dimensions array");
    assert_eq!(dims.len(), 1);
    assert_eq!(dims[0]["dimension"], "security");
}

#[test]
fn validate_rejects_an_unknown_dimension() {
    let project = Project::empty();
    let target = project.path().join("target-dir");
    std::fs::create_dir_all(&target).expect("create validate target");

    project
        .hive()
        .args([
            "validate",
            target.to_str().unwrap(),
            "--dimensions",
            "performance",
        ])
        .fails();
}

#[test]
fn validate_cross_validate_runs_the_requested_drone_count() {
    let project = Project::empty();
    let target = project.path().join("target-dir");
    std::fs::create_dir_all(&target).expect("create validate target");

    let assert = project
        .hive()
        .args([
            "--format",
            "json",
            "validate",
            target.to_str().unwrap(),
            "--cross-validate",
            "--drones",
            "3",
        ])
        .output()
        .expect("run hive validate --cross-validate");
    let stdout = String::from_utf8_lossy(&assert.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("cross-validate prints json report");
    assert_eq!(value["reports"].as_array().expect("reports array").len(), 3);
}
