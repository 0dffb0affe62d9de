// SPDX-License-Identifier: MIT

//! The Queen scheduler (§4.4): dispatches ready cells onto pool
//! workers, launches their agent processes, drives post-completion
//! consensus validation, and runs the background heartbeat that
//! reconciles pool liveness with the Pheromone Bus.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use hive_core::{CellId, Clock, HiveConfig, Platform, Priority, SystemClock, WorkerId};
use hive_dag::CellDag;
use hive_pheromone::{EntryType, HiveStatus, PheromoneBus, WorkerStatusEntry};
use hive_pool::{WorkerPool, WorkerTask};
use hive_store::{CellStatus, CellStore, GitWorktreeBackend, WorktreeBackend};
use hive_validator::ValidationRunner;

use crate::command;
use crate::error::QueenError;
use crate::registry;
use crate::state::QueenPhase;

/// An in-process notification of something the scheduler did. Delivered
/// on a channel per subscriber rather than via a shared callback, so a
/// slow or panicking listener cannot block the scheduler (§9 REDESIGN
/// FLAGS).
#[derive(Debug, Clone)]
pub enum QueenEvent {
    Dispatched { cell_id: CellId, worker_id: WorkerId },
    Completed { cell_id: CellId },
    Failed { cell_id: CellId, reason: String },
    Blocked { cell_id: CellId, reason: String },
    TimedOut { cell_id: CellId, worker_id: WorkerId },
    WorkerError { worker_id: WorkerId, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub dispatched: Vec<(WorkerId, CellId)>,
    pub remaining_ready: usize,
    pub idle_workers: usize,
}

/// The scheduler. Shared across the CLI's command handlers and its own
/// heartbeat thread via `Arc`; every public method that can run from a
/// background thread takes `self: &Arc<Self>`.
pub struct Queen {
    project_root: PathBuf,
    config: HiveConfig,
    dag: Arc<CellDag>,
    pool: Arc<WorkerPool>,
    store: Arc<CellStore>,
    bus: Arc<PheromoneBus>,
    validator: Arc<ValidationRunner>,
    clock: Arc<dyn Clock>,
    phase: Mutex<QueenPhase>,
    dispatch_lock: Mutex<()>,
    registry_token: Mutex<Option<u64>>,
    stop_flag: Arc<AtomicBool>,
    heartbeat_handle: Mutex<Option<JoinHandle<()>>>,
    subscribers: Mutex<Vec<mpsc::Sender<QueenEvent>>>,
}

fn derive_hive_id(project_root: &Path) -> String {
    project_root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("hive")
        .to_string()
}

impl Queen {
    /// Wire up every component against real storage under
    /// `project_root`: config from `.trellis/hive-config.yaml`, a real
    /// git worktree backend, and the system clock.
    pub fn new(project_root: impl Into<PathBuf>) -> Result<Arc<Self>, QueenError> {
        let project_root = project_root.into();
        let config = HiveConfig::load(&project_root)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let bus = Arc::new(PheromoneBus::new(
            derive_hive_id(&project_root),
            project_root.join(&config.pheromone.file),
            clock.clone(),
        ));

        let event_log_path = project_root.join(".trellis").join("worker-events.jsonl");
        let pool = WorkerPool::new(config.worker_pool.clone(), clock.clone(), Some(event_log_path));
        // The heartbeat monitor flips a stale worker using the pheromone
        // bus's own staleness window, not the agent-process exit timeout.
        pool.set_heartbeat_timeout_secs(config.pheromone.timeout_secs);
        let pool = Arc::new(pool);

        let worktree_backend: Arc<dyn WorktreeBackend> = Arc::new(GitWorktreeBackend);
        let store = Arc::new(CellStore::new(
            project_root.clone(),
            clock.clone(),
            Some(bus.clone()),
            worktree_backend,
        ));

        let dag_path = project_root.join(".trellis").join("cell_dag.json");
        let dag = if config.dag.persist_state && dag_path.exists() {
            Arc::new(CellDag::load(&dag_path)?)
        } else {
            Arc::new(CellDag::new())
        };

        let audit_dir = hive_validator::default_audit_dir(&project_root);
        let validator = Arc::new(ValidationRunner::new(store.clone(), audit_dir));

        Ok(Arc::new(Self::from_parts(
            project_root,
            config,
            dag,
            pool,
            store,
            bus,
            validator,
            clock,
        )))
    }

    /// Assemble a Queen from already-built components, for tests: a
    /// `FakeClock`, a `NoopWorktreeBackend`-backed store, and an empty
    /// or pre-seeded `CellDag`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        project_root: PathBuf,
        config: HiveConfig,
        dag: Arc<CellDag>,
        pool: Arc<WorkerPool>,
        store: Arc<CellStore>,
        bus: Arc<PheromoneBus>,
        validator: Arc<ValidationRunner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            project_root,
            config,
            dag,
            pool,
            store,
            bus,
            validator,
            clock,
            phase: Mutex::new(QueenPhase::Idle),
            dispatch_lock: Mutex::new(()),
            registry_token: Mutex::new(None),
            stop_flag: Arc::new(AtomicBool::new(false)),
            heartbeat_handle: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &HiveConfig {
        &self.config
    }

    pub fn dag(&self) -> &Arc<CellDag> {
        &self.dag
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn store(&self) -> &Arc<CellStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<PheromoneBus> {
        &self.bus
    }

    pub fn validator(&self) -> &Arc<ValidationRunner> {
        &self.validator
    }

    pub fn phase(&self) -> QueenPhase {
        *self.phase.lock()
    }

    /// Register with the process-wide exit registry, flip the shared
    /// state to active, and start the background heartbeat thread.
    #[instrument(skip(self))]
    pub fn start(self: &Arc<Self>) -> Result<(), QueenError> {
        {
            let mut phase = self.phase.lock();
            if *phase == QueenPhase::Running {
                return Err(QueenError::AlreadyRunning);
            }
            *phase = QueenPhase::Running;
        }
        self.stop_flag.store(false, Ordering::SeqCst);

        let now = self.clock.unix_secs();
        let mut state = self.bus.read()?;
        state.status = HiveStatus::Active;
        state.queen.phase = QueenPhase::Running.to_string();
        state.queen.last_heartbeat = now;
        self.bus.write(&state)?;

        *self.registry_token.lock() = Some(registry::register(&self.pool));

        let this = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("queen-heartbeat".to_string())
            .spawn(move || this.run_heartbeat())?;
        *self.heartbeat_handle.lock() = Some(handle);

        info!("queen started");
        Ok(())
    }

    /// Stop the heartbeat thread, tear down every pool-tracked process,
    /// unregister, and mark the shared state inactive. Idempotent.
    #[instrument(skip(self))]
    pub fn stop(&self, timeout: Duration) -> Result<(), QueenError> {
        {
            let mut phase = self.phase.lock();
            if *phase == QueenPhase::Stopped {
                return Ok(());
            }
            *phase = QueenPhase::Stopped;
        }
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.heartbeat_handle.lock().take() {
            let _ = handle.join();
        }
        self.pool.stop(timeout);
        if let Some(token) = self.registry_token.lock().take() {
            registry::unregister(token);
        }
        if let Ok(mut state) = self.bus.read() {
            state.status = HiveStatus::Inactive;
            state.queen.phase = QueenPhase::Stopped.to_string();
            let _ = self.bus.write(&state);
        }
        info!("queen stopped");
        Ok(())
    }

    pub fn pause(&self) -> Result<(), QueenError> {
        let mut phase = self.phase.lock();
        if *phase != QueenPhase::Running {
            return Err(QueenError::NotRunning);
        }
        *phase = QueenPhase::Paused;
        Ok(())
    }

    pub fn resume(&self) -> Result<(), QueenError> {
        let mut phase = self.phase.lock();
        if *phase != QueenPhase::Paused {
            return Err(QueenError::NotRunning);
        }
        *phase = QueenPhase::Running;
        Ok(())
    }

    fn admission_cap(&self) -> usize {
        (self.config.queen.max_concurrent_cells as usize)
            .min(self.config.dag.parallel_layer_limit as usize)
            .max(1)
    }

    /// An open-ended `CellNode.priority` folded onto the Pool's 3-band
    /// scale. Not specified by the data model; `>5` maps to `High`, `>=1`
    /// to `Medium`, everything else (including negative priorities) to
    /// `Low`.
    fn priority_band(priority: i64) -> Priority {
        if priority > 5 {
            Priority::High
        } else if priority >= 1 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    fn drone_count(&self) -> usize {
        ((self.config.worker_pool.default_workers as f64) * self.config.swarm.drone_ratio)
            .round()
            .max(1.0) as usize
    }

    /// Admit up to `admission_cap` ready cells onto idle workers and
    /// spawn each one's execution in the background. Does not block on
    /// any agent process completing.
    #[instrument(skip(self))]
    pub fn dispatch(self: &Arc<Self>) -> Result<DispatchOutcome, QueenError> {
        let _guard = self.dispatch_lock.lock();
        let ready = self.dag.get_ready_cells();
        let cap = self.admission_cap();
        let mut dispatched = Vec::new();
        for cell_id in ready.iter().take(cap) {
            match self.try_bind(cell_id, Platform::Claude)? {
                Some(worker_id) => {
                    self.spawn_execution(worker_id.clone(), cell_id.clone(), Platform::Claude)?;
                    dispatched.push((worker_id, cell_id.clone()));
                }
                None => break,
            }
        }
        Ok(DispatchOutcome {
            remaining_ready: ready.len().saturating_sub(dispatched.len()),
            idle_workers: self.pool.idle_count(),
            dispatched,
        })
    }

    /// Bind one specific cell to a worker and run it, either in the
    /// background (returning immediately) or in the foreground (blocking
    /// until the agent process exits and validation resolves).
    #[instrument(skip(self))]
    pub fn run_cell(self: &Arc<Self>, cell_id: &CellId, platform: Platform, background: bool) -> Result<WorkerId, QueenError> {
        let _guard = self.dispatch_lock.lock();
        let worker_id = self.try_bind(cell_id, platform)?.ok_or(QueenError::NothingToDispatch)?;
        if background {
            self.spawn_execution(worker_id.clone(), cell_id.clone(), platform)?;
        } else {
            self.execute_task(worker_id.clone(), cell_id.clone(), platform);
        }
        Ok(worker_id)
    }

    /// Assign `cell_id` to an idle worker and flip its dag/store/bus
    /// state to running. Returns `Ok(None)` rather than an error when
    /// the pool simply has no idle worker right now.
    fn try_bind(&self, cell_id: &CellId, platform: Platform) -> Result<Option<WorkerId>, QueenError> {
        let node = self.dag.node(cell_id).ok_or_else(|| hive_dag::DagError::UnknownCell(cell_id.clone()))?;
        let cell = self.store.get(cell_id)?;
        let task = WorkerTask::new(
            cell_id.clone(),
            Self::priority_band(node.priority),
            self.config.worker_pool.worker_timeout_secs,
            platform,
            self.clock.unix_secs(),
        )
        .with_paths(cell.inputs.clone(), cell.outputs.clone());
        let task = match &cell.worktree_path {
            Some(path) => task.with_worktree(PathBuf::from(path)),
            None => task,
        };

        match self.pool.assign_cell(task) {
            Ok(worker_id) => {
                let now = self.clock.unix_secs();
                self.dag.mark_running(cell_id, now)?;
                self.store.update_status(cell_id, CellStatus::InProgress, "queen")?;
                self.bus.emit(
                    EntryType::Progress,
                    "queen",
                    serde_json::json!({"cell_id": cell_id.as_str(), "worker_id": worker_id.as_str()}),
                    Some(cell_id.as_str().to_string()),
                    None,
                    None,
                )?;
                self.emit_event(QueenEvent::Dispatched {
                    cell_id: cell_id.clone(),
                    worker_id: worker_id.clone(),
                });
                Ok(Some(worker_id))
            }
            Err(hive_pool::PoolError::NoIdleWorker) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn spawn_execution(self: &Arc<Self>, worker_id: WorkerId, cell_id: CellId, platform: Platform) -> Result<(), QueenError> {
        let queen = Arc::clone(self);
        thread::Builder::new()
            .name(format!("queen-exec-{cell_id}"))
            .spawn(move || queen.execute_task(worker_id, cell_id, platform))?;
        Ok(())
    }

    /// Launch the agent process for `cell_id` on `worker_id` and carry
    /// it through to completion/failure/timeout. Runs on its own thread
    /// (spawned by `dispatch`/`run_cell`); errors are logged and turned
    /// into a `WorkerError` event rather than propagated, since nothing
    /// is left to receive a `Result` once the thread has started.
    fn execute_task(&self, worker_id: WorkerId, cell_id: CellId, platform: Platform) {
        if let Err(e) = self.execute_task_inner(&worker_id, &cell_id, platform) {
            warn!(cell_id = %cell_id, worker = %worker_id, error = %e, "task execution failed");
            self.emit_event(QueenEvent::WorkerError {
                worker_id,
                message: e.to_string(),
            });
        }
    }

    fn execute_task_inner(&self, worker_id: &WorkerId, cell_id: &CellId, platform: Platform) -> Result<(), QueenError> {
        let cell = self.store.get(cell_id)?;
        let cwd = cell
            .worktree_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.project_root.clone());
        if let Err(e) = write_task_sentinel(&cwd, cell_id) {
            self.pool.release(worker_id, false)?;
            self.fail_cell(cell_id, format!("failed to write task sentinel: {e}"))?;
            return Ok(());
        }

        let (program, args) = command::agent_command(platform);
        let handle = match hive_pool::spawn(program, &args, &cwd) {
            Ok(handle) => handle,
            Err(e) => {
                self.pool.release(worker_id, false)?;
                self.fail_cell(cell_id, format!("failed to spawn agent process: {e}"))?;
                return Ok(());
            }
        };
        self.pool.attach_process(worker_id.clone(), Box::new(handle));

        let timeout = Duration::from_secs(self.config.worker_pool.worker_timeout_secs.max(1));
        let deadline = Instant::now() + timeout;
        match self.pool.wait_for_exit(worker_id, deadline)? {
            Some(true) => {
                self.pool.release(worker_id, true)?;
                self.finish_success(cell_id)
            }
            Some(false) => {
                self.pool.release(worker_id, false)?;
                self.fail_cell(cell_id, "agent process exited with a non-zero status")
            }
            None => {
                self.pool.mark_timeout(worker_id)?;
                let reason = format!(
                    "worker {worker_id} exceeded its {}s timeout",
                    self.config.worker_pool.worker_timeout_secs
                );
                self.handle_blocker(cell_id, reason)?;
                self.emit_event(QueenEvent::TimedOut {
                    cell_id: cell_id.clone(),
                    worker_id: worker_id.clone(),
                });
                Ok(())
            }
        }
    }

    /// Cross-validate a successfully-exited cell, retrying up to
    /// `drone.max_iterations` while consensus isn't reached, then
    /// complete or fail it.
    fn finish_success(&self, cell_id: &CellId) -> Result<(), QueenError> {
        let n = self.drone_count();
        let max_iterations = self.config.drone.max_iterations.max(1);
        let mut outcome = self.validator.cross_validate(cell_id, n, None)?;
        let mut attempt = 1u32;
        while !outcome.consensus_reached && attempt < max_iterations {
            debug!(cell_id = %cell_id, attempt, "validation consensus not reached, retrying");
            outcome = self.validator.cross_validate(cell_id, n, None)?;
            attempt += 1;
        }

        if outcome.consensus_reached {
            let now = self.clock.unix_secs();
            self.dag.mark_completed(cell_id, now)?;
            self.store.update_status(cell_id, CellStatus::Completed, "queen")?;
            self.bus.emit(
                EntryType::Completion,
                "queen",
                serde_json::json!({"cell_id": cell_id.as_str(), "consensus_mean": outcome.mean}),
                Some(cell_id.as_str().to_string()),
                None,
                None,
            )?;
            self.emit_event(QueenEvent::Completed { cell_id: cell_id.clone() });
            Ok(())
        } else {
            self.fail_cell(
                cell_id,
                format!(
                    "validation consensus not reached after {attempt} attempt(s) (mean={:.1})",
                    outcome.mean
                ),
            )
        }
    }

    fn fail_cell(&self, cell_id: &CellId, reason: impl Into<String>) -> Result<(), QueenError> {
        let reason = reason.into();
        let now = self.clock.unix_secs();
        let blocked = self.dag.mark_failed(cell_id, now)?;
        self.store.update_status(cell_id, CellStatus::Failed, "queen")?;
        for blocked_id in &blocked {
            if let Err(e) = self.store.update_status(blocked_id, CellStatus::Blocked, "queen") {
                warn!(cell_id = %blocked_id, error = %e, "failed to mirror dependent block onto the store");
            }
        }
        self.bus.emit(
            EntryType::Alert,
            "queen",
            serde_json::json!({"cell_id": cell_id.as_str(), "reason": reason}),
            Some(cell_id.as_str().to_string()),
            None,
            None,
        )?;
        self.emit_event(QueenEvent::Failed {
            cell_id: cell_id.clone(),
            reason,
        });
        Ok(())
    }

    /// Block a cell: mark it blocked in the store and, if it's bound to
    /// a worker, mark that worker blocked too. Deliberately leaves the
    /// dag node's state untouched -- unlike `mark_failed`, a blocker is
    /// not a dependency-graph event.
    pub fn handle_blocker(&self, cell_id: &CellId, reason: impl Into<String>) -> Result<(), QueenError> {
        let reason = reason.into();
        self.store.update_status(cell_id, CellStatus::Blocked, "queen")?;
        if let Some(worker_id) = self.pool.find_worker_for_cell(cell_id) {
            self.pool.set_blocked(&worker_id)?;
        }
        self.bus.emit_blocker(cell_id.as_str(), reason.clone(), "queen")?;
        self.emit_event(QueenEvent::Blocked {
            cell_id: cell_id.clone(),
            reason,
        });
        Ok(())
    }

    /// Reverse `handle_blocker`: requires the cell to currently be
    /// blocked, resets it to pending, and (manually) returns its bound
    /// worker to idle -- it does not auto-unblock dag descendants.
    pub fn resolve_blocker(&self, cell_id: &CellId) -> Result<(), QueenError> {
        let cell = self.store.get(cell_id)?;
        if cell.status != CellStatus::Blocked {
            return Err(QueenError::NotBlocked(cell_id.clone()));
        }
        self.store.update_status(cell_id, CellStatus::Pending, "queen")?;
        if self.dag.contains(cell_id) {
            self.dag.reset_cell(cell_id)?;
        }
        if let Some(worker_id) = self.pool.find_worker_for_cell(cell_id) {
            self.pool.unblock(&worker_id)?;
        }
        self.bus.resolve_blocker(cell_id.as_str(), "queen")?;
        Ok(())
    }

    fn run_heartbeat(self: Arc<Self>) {
        let interval = Duration::from_secs(self.config.queen.heartbeat_interval_secs.max(1));
        while !self.stop_flag.load(Ordering::SeqCst) {
            thread::sleep(interval);
            if self.stop_flag.load(Ordering::SeqCst) {
                break;
            }
            self.heartbeat_tick();
        }
    }

    fn heartbeat_tick(&self) {
        let now = self.clock.unix_secs();
        for worker_id in self.pool.heartbeat_tick(now) {
            let Some(worker) = self.pool.get(&worker_id) else { continue };
            let Some(task) = worker.current_task else { continue };
            let reason = format!("worker {worker_id} heartbeat timed out");
            if let Err(e) = self.handle_blocker(&task.cell_id, reason) {
                warn!(worker = %worker_id, error = %e, "failed to record heartbeat timeout blocker");
                continue;
            }
            self.emit_event(QueenEvent::TimedOut {
                cell_id: task.cell_id,
                worker_id,
            });
        }
        if let Err(e) = self.coordinate_pheromone_sync(now) {
            warn!(error = %e, "failed to sync pheromone state");
        }
        if let Err(e) = self.bus.decay(now) {
            warn!(error = %e, "failed to decay pheromone entries");
        }
    }

    fn coordinate_pheromone_sync(&self, now: u64) -> Result<(), QueenError> {
        let mut state = self.bus.read()?;
        state.queen.phase = self.phase().to_string();
        state.queen.last_heartbeat = now;
        for worker in self.pool.all_workers() {
            state.upsert_worker(WorkerStatusEntry {
                id: worker.id.as_str().to_string(),
                cell: worker.current_task.as_ref().map(|t| t.cell_id.as_str().to_string()),
                status: worker.state.to_string(),
                progress: worker.progress,
                last_update: worker.last_heartbeat,
                blocked_by: None,
                block_reason: None,
            });
        }
        self.bus.write(&state)?;
        Ok(())
    }

    /// Subscribe to scheduler events. Delivery is best-effort: a
    /// disconnected receiver is pruned on the next emit rather than
    /// causing a send error anywhere else.
    pub fn subscribe(&self) -> mpsc::Receiver<QueenEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    fn emit_event(&self, event: QueenEvent) {
        self.subscribers.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn write_task_sentinel(cwd: &Path, cell_id: &CellId) -> Result<(), QueenError> {
    std::fs::create_dir_all(cwd)?;
    std::fs::write(cwd.join(".current-task"), cell_id.as_str())?;
    Ok(())
}

#[cfg(test)]
#[path = "queen_tests.rs"]
mod tests;
