// SPDX-License-Identifier: MIT

//! Version-control worktree operations (§6): creation with a new
//! branch, forced removal, and branch deletion. Invoked by argument
//! vector, never through a shell. The underlying VCS is an external
//! collaborator; this module only shapes the three calls the Cell
//! Store needs against it.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::StoreError;

/// Abstraction over the three worktree operations a Cell Store needs,
/// so tests can substitute a no-op backend without a real repository.
pub trait WorktreeBackend: Send + Sync {
    fn create(&self, project_root: &Path, worktree_path: &Path, branch: &str) -> Result<(), StoreError>;
    fn remove(&self, project_root: &Path, worktree_path: &Path) -> Result<(), StoreError>;
    fn delete_branch(&self, project_root: &Path, branch: &str) -> Result<(), StoreError>;
}

/// The real backend: shells out to `git worktree add/remove` and
/// `git branch -D` with a fixed, non-shell argument vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitWorktreeBackend;

impl WorktreeBackend for GitWorktreeBackend {
    fn create(&self, project_root: &Path, worktree_path: &Path, branch: &str) -> Result<(), StoreError> {
        run(
            project_root,
            &[
                "worktree",
                "add",
                "-b",
                branch,
                &worktree_path.to_string_lossy(),
            ],
        )
    }

    fn remove(&self, project_root: &Path, worktree_path: &Path) -> Result<(), StoreError> {
        run(
            project_root,
            &["worktree", "remove", "--force", &worktree_path.to_string_lossy()],
        )
    }

    fn delete_branch(&self, project_root: &Path, branch: &str) -> Result<(), StoreError> {
        run(project_root, &["branch", "-D", branch])
    }
}

fn run(project_root: &Path, args: &[&str]) -> Result<(), StoreError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(project_root)
        .output()
        .map_err(|e| StoreError::Command {
            command: format!("git {}", args.join(" ")),
            detail: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(StoreError::Command {
            command: format!("git {}", args.join(" ")),
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// A backend that only tracks calls made against it; used by tests that
/// exercise `CellStore` lifecycle methods without a real git checkout.
#[derive(Debug, Default)]
pub struct NoopWorktreeBackend {
    pub calls: parking_lot::Mutex<Vec<String>>,
}

impl WorktreeBackend for NoopWorktreeBackend {
    fn create(&self, _project_root: &Path, worktree_path: &Path, branch: &str) -> Result<(), StoreError> {
        self.calls
            .lock()
            .push(format!("create {} {}", worktree_path.display(), branch));
        Ok(())
    }

    fn remove(&self, _project_root: &Path, worktree_path: &Path) -> Result<(), StoreError> {
        self.calls.lock().push(format!("remove {}", worktree_path.display()));
        Ok(())
    }

    fn delete_branch(&self, _project_root: &Path, branch: &str) -> Result<(), StoreError> {
        self.calls.lock().push(format!("delete_branch {branch}"));
        Ok(())
    }
}

pub fn default_worktree_path(worktree_base: &Path, id: &str) -> PathBuf {
    worktree_base.join(id)
}
