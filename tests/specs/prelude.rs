//! Shared black-box test harness for every spec module: a throwaway
//! project directory and a thin wrapper over `assert_cmd::Command`
//! that asserts exit status before handing back stdout/stderr.

use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use tempfile::TempDir;

/// A disposable project root under `.trellis/`, torn down on drop.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// A bare directory with no `.trellis/` at all; every command
    /// under test must tolerate this (config falls back to defaults,
    /// the dag/store/bus lazily create their files on first write).
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("create temp project dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn trellis_dir(&self) -> PathBuf {
        self.path().join(".trellis")
    }

    /// Write a file relative to the project root, creating parent
    /// directories as needed.
    pub fn file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// Write `.trellis/hive-config.yaml`.
    pub fn config(&self, yaml: &str) -> &Self {
        self.file(".trellis/hive-config.yaml", yaml);
        self
    }

    /// Register a cell by writing `cell.json` directly, matching the
    /// Cell Store's own on-disk layout.
    pub fn cell(&self, id: &str, status: &str, dependencies: &[&str]) -> &Self {
        let deps = dependencies
            .iter()
            .map(|d| format!("\"{d}\""))
            .collect::<Vec<_>>()
            .join(", ");
        self.file(
            &format!(".trellis/cells/{id}/cell.json"),
            &format!(
                r#"{{
  "id": "{id}",
  "description": "spec fixture",
  "inputs": [],
  "outputs": [],
  "dependencies": [{deps}],
  "status": "{status}",
  "created_at": "2026-01-01T00:00:00Z",
  "updated_at": "2026-01-01T00:00:00Z"
}}"#
            ),
        );
        self
    }

    /// Register a dag node directly into `.trellis/cell_dag.json`,
    /// replacing whatever document is already there.
    pub fn dag_nodes(&self, nodes_json: &str) -> &Self {
        self.file(
            ".trellis/cell_dag.json",
            &format!(
                r#"{{"nodes": [{nodes_json}], "completed": [], "running": [], "failed": []}}"#
            ),
        );
        self
    }

    /// A fresh invocation of the `hive` binary rooted at this project.
    pub fn hive(&self) -> Command {
        let mut cmd = Command::cargo_bin("hive").expect("hive binary built");
        cmd.arg("--project-root").arg(self.path());
        cmd
    }
}

/// Extension methods shared by every assertion site below.
pub trait CommandExt {
    fn passes(self) -> Assert;
    fn fails(self) -> Assert;
}

impl CommandExt for Command {
    fn passes(mut self) -> Assert {
        self.assert().success()
    }

    fn fails(mut self) -> Assert {
        self.assert().failure()
    }
}

pub trait AssertExt {
    fn stdout_has(self, needle: &str) -> Assert;
    fn stdout(&self) -> String;
}

impl AssertExt for Assert {
    fn stdout_has(self, needle: &str) -> Assert {
        let out = String::from_utf8_lossy(&self.get_output().stdout).into_owned();
        assert!(out.contains(needle), "expected stdout to contain {needle:?}, got:\n{out}");
        self
    }

    fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.get_output().stdout).into_owned()
    }
}

/// Parse a command's JSON stdout, asserting it parses cleanly.
pub fn json_stdout(assert: &Assert) -> serde_json::Value {
    let out = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    serde_json::from_str(&out).unwrap_or_else(|e| panic!("stdout was not valid JSON ({e}):\n{out}"))
}
