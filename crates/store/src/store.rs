// SPDX-License-Identifier: MIT

//! `CellStore`: the Cell Store component (§2, §3) -- owns on-disk cell
//! metadata, context logs, and worktree bindings. Depends on the
//! Pheromone Bus to mirror status transitions onto the shared state.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::glob;
use serde_json::Value;
use tracing::{instrument, warn};

use hive_core::validate::validate_relative_path;
use hive_core::{CellId, Clock};
use hive_pheromone::{EntryType, PheromoneBus};

use crate::cell::{Cell, CellStatus};
use crate::error::StoreError;
use crate::worktree::WorktreeBackend;

/// Owns `<project>/.trellis/cells/<id>/` for every cell: `cell.json`
/// metadata (atomic tmp+rename writes) and an append-only
/// `context.jsonl` log.
pub struct CellStore {
    project_root: PathBuf,
    trellis_dir: PathBuf,
    clock: Arc<dyn Clock>,
    bus: Option<Arc<PheromoneBus>>,
    worktree_backend: Arc<dyn WorktreeBackend>,
}

impl CellStore {
    pub fn new(
        project_root: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        bus: Option<Arc<PheromoneBus>>,
        worktree_backend: Arc<dyn WorktreeBackend>,
    ) -> Self {
        let project_root = project_root.into();
        let trellis_dir = project_root.join(".trellis");
        Self {
            project_root,
            trellis_dir,
            clock,
            bus,
            worktree_backend,
        }
    }

    fn cell_dir(&self, id: &CellId) -> PathBuf {
        self.trellis_dir.join("cells").join(id.as_str())
    }

    fn cell_json_path(&self, id: &CellId) -> PathBuf {
        self.cell_dir(id).join("cell.json")
    }

    fn context_path(&self, id: &CellId) -> PathBuf {
        self.cell_dir(id).join("context.jsonl")
    }

    /// Create a cell's metadata on disk. `inputs`/`outputs` are
    /// validated as project-relative paths (no traversal, no absolute
    /// paths); a single trailing `*` glob segment is permitted in an
    /// output.
    #[instrument(skip(self))]
    pub fn create_cell(
        &self,
        id: CellId,
        description: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        dependencies: Vec<CellId>,
    ) -> Result<Cell, StoreError> {
        let dir = self.cell_dir(&id);
        if dir.exists() {
            return Err(StoreError::AlreadyExists(id));
        }
        for input in &inputs {
            validate_relative_path(input)?;
        }
        for output in &outputs {
            let trimmed = output.strip_suffix('*').unwrap_or(output);
            validate_relative_path(trimmed)?;
        }
        let now = self.clock.now_iso8601();
        let cell = Cell::new(id, description, inputs, outputs, dependencies, now);
        self.write_cell(&cell)?;
        Ok(cell)
    }

    fn write_cell(&self, cell: &Cell) -> Result<(), StoreError> {
        let dir = self.cell_dir(&cell.id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(dir.clone(), e))?;
        let path = self.cell_json_path(&cell.id);
        let tmp_path = dir.join(format!(".cell.json.tmp-{}", std::process::id()));
        let bytes = serde_json::to_vec_pretty(cell)?;
        fs::write(&tmp_path, &bytes).map_err(|e| StoreError::io(tmp_path.clone(), e))?;
        fs::rename(&tmp_path, &path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    pub fn get(&self, id: &CellId) -> Result<Cell, StoreError> {
        let path = self.cell_json_path(id);
        let text = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::UnknownCell(id.clone())
            } else {
                StoreError::io(path.clone(), e)
            }
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn list(&self) -> Result<Vec<Cell>, StoreError> {
        let cells_dir = self.trellis_dir.join("cells");
        if !cells_dir.exists() {
            return Ok(Vec::new());
        }
        let mut cells = Vec::new();
        for entry in fs::read_dir(&cells_dir).map_err(|e| StoreError::io(cells_dir.clone(), e))? {
            let entry = entry.map_err(|e| StoreError::io(cells_dir.clone(), e))?;
            let cell_json = entry.path().join("cell.json");
            if cell_json.exists() {
                let text = fs::read_to_string(&cell_json).map_err(|e| StoreError::io(cell_json.clone(), e))?;
                cells.push(serde_json::from_str(&text)?);
            }
        }
        cells.sort_by(|a: &Cell, b: &Cell| a.id.as_str().cmp(b.id.as_str()));
        Ok(cells)
    }

    /// Change a cell's status, refreshing `updated_at`, and mirror the
    /// transition onto the Pheromone Bus as a worker-status update
    /// (source identifies the caller, e.g. a worker id or "queen").
    #[instrument(skip(self))]
    pub fn update_status(
        &self,
        id: &CellId,
        status: CellStatus,
        source: &str,
    ) -> Result<Cell, StoreError> {
        let mut cell = self.get(id)?;
        cell.status = status;
        cell.updated_at = self.clock.now_iso8601();
        self.write_cell(&cell)?;

        if let Some(bus) = &self.bus {
            let kind = match status {
                CellStatus::Completed => EntryType::Completion,
                CellStatus::Failed | CellStatus::Blocked => EntryType::Blocker,
                _ => EntryType::Progress,
            };
            if let Err(e) = bus.emit(
                kind,
                source,
                serde_json::json!({"cell_id": id.as_str(), "status": status.to_string()}),
                Some(id.as_str().to_string()),
                None,
                None,
            ) {
                warn!(error = %e, "failed to mirror cell status onto pheromone bus");
            }
        }
        Ok(cell)
    }

    pub fn bind_worktree(&self, id: &CellId, worktree_path: PathBuf, branch: impl Into<String>) -> Result<Cell, StoreError> {
        let branch = branch.into();
        self.worktree_backend.create(&self.project_root, &worktree_path, &branch)?;
        let mut cell = self.get(id)?;
        cell.worktree_path = Some(worktree_path.to_string_lossy().into_owned());
        cell.branch = Some(branch);
        cell.updated_at = self.clock.now_iso8601();
        self.write_cell(&cell)?;
        Ok(cell)
    }

    /// Append one JSON record as a line to the cell's context log.
    pub fn append_context(&self, id: &CellId, record: Value) -> Result<(), StoreError> {
        let path = self.context_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent.to_path_buf(), e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(path.clone(), e))?;
        writeln!(file, "{}", serde_json::to_string(&record)?).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    /// The base directory outputs resolve against: the bound worktree,
    /// or the project root if none is bound (§3 invariant).
    pub fn output_base(&self, cell: &Cell) -> PathBuf {
        match &cell.worktree_path {
            Some(p) => PathBuf::from(p),
            None => self.project_root.clone(),
        }
    }

    /// Confirm every declared output (literal or glob) resolves to at
    /// least one existing path under the cell's output base.
    pub fn verify_outputs(&self, cell: &Cell) -> Result<(), StoreError> {
        let base = self.output_base(cell);
        for output in &cell.outputs {
            if !output_exists(&base, output) {
                return Err(StoreError::MissingOutput(cell.id.clone(), output.clone()));
            }
        }
        Ok(())
    }

    /// Remove a cell's bound worktree (forced) and branch, then delete
    /// its on-disk directory.
    #[instrument(skip(self))]
    pub fn cleanup(&self, id: &CellId) -> Result<(), StoreError> {
        let cell = self.get(id)?;
        if let Some(worktree_path) = &cell.worktree_path {
            self.worktree_backend
                .remove(&self.project_root, Path::new(worktree_path))?;
        }
        if let Some(branch) = &cell.branch {
            self.worktree_backend.delete_branch(&self.project_root, branch)?;
        }
        let dir = self.cell_dir(id);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| StoreError::io(dir, e))?;
        }
        Ok(())
    }

    /// Atomically move a cell's directory into `archive/<YYYY-MM>/<id>/`,
    /// leaving no residue in the live set.
    #[instrument(skip(self))]
    pub fn archive(&self, id: &CellId) -> Result<PathBuf, StoreError> {
        let dir = self.cell_dir(id);
        if !dir.exists() {
            return Err(StoreError::UnknownCell(id.clone()));
        }
        let month = self.clock.now_iso8601();
        let month_tag = month.get(0..7).unwrap_or("1970-01").to_string();
        let archive_dir = self.trellis_dir.join("archive").join(&month_tag);
        fs::create_dir_all(&archive_dir).map_err(|e| StoreError::io(archive_dir.clone(), e))?;
        let dest = archive_dir.join(id.as_str());
        fs::rename(&dir, &dest).map_err(|e| StoreError::io(dest.clone(), e))?;
        Ok(dest)
    }
}

/// The declared outputs that do not resolve to any existing path under
/// `base` (literal paths are checked directly; a trailing `*` segment
/// is matched as a glob). Exposed for the Drone Validator's strategic
/// output-presence subcheck (§4.5), which needs the list of absences
/// rather than a single verdict.
pub fn missing_outputs(base: &Path, outputs: &[String]) -> Vec<String> {
    outputs
        .iter()
        .filter(|o| !output_exists(base, o))
        .cloned()
        .collect()
}

fn output_exists(base: &Path, pattern: &str) -> bool {
    if pattern.contains('*') {
        let full_pattern = base.join(pattern);
        match glob(&full_pattern.to_string_lossy()) {
            Ok(paths) => paths.filter_map(Result::ok).next().is_some(),
            Err(_) => false,
        }
    } else {
        base.join(pattern).exists()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
