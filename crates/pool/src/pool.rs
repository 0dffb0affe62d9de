// SPDX-License-Identifier: MIT

//! `WorkerPool`: the bounded pool with priority-queued intake, atomic
//! assignment, heartbeat-based liveness, and cooperative/forced
//! process teardown (§4.3).

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use hive_core::{CellId, Clock, WorkerId, WorkerPoolConfig};

use crate::error::PoolError;
use crate::process::ProcessHandle;
use crate::queue::PriorityQueue;
use crate::task::WorkerTask;
use crate::worker::{Worker, WorkerState};

const SUBMIT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);
const SUBMIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize)]
struct TimeoutEvent {
    worker_id: String,
    cell_id: Option<String>,
    last_heartbeat: u64,
    now: u64,
}

struct Inner {
    workers: IndexMap<WorkerId, Worker>,
    queue: PriorityQueue,
    stopped: bool,
}

/// A bounded pool of worker slots. Interior-mutable: the Queen and
/// monitor thread share one instance.
pub struct WorkerPool {
    inner: Mutex<Inner>,
    processes: Mutex<HashMap<WorkerId, Box<dyn ProcessHandle>>>,
    config: WorkerPoolConfig,
    clock: Arc<dyn Clock>,
    next_seq: AtomicUsize,
    event_log_path: Option<PathBuf>,
    heartbeat_timeout_secs: AtomicU64,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig, clock: Arc<dyn Clock>, event_log_path: Option<PathBuf>) -> Self {
        let heartbeat_timeout_secs = AtomicU64::new(config.worker_timeout_secs);
        let pool = Self {
            inner: Mutex::new(Inner {
                workers: IndexMap::new(),
                queue: PriorityQueue::new(),
                stopped: false,
            }),
            processes: Mutex::new(HashMap::new()),
            config,
            clock,
            next_seq: AtomicUsize::new(1),
            event_log_path,
            heartbeat_timeout_secs,
        };
        let min = pool.config.min_workers as usize;
        {
            let mut inner = pool.inner.lock();
            for _ in 0..min {
                let worker = pool.spawn_worker_locked(&mut inner);
                debug!(worker = %worker, "spawned initial worker");
            }
        }
        pool
    }

    fn now(&self) -> u64 {
        self.clock.unix_secs()
    }

    fn spawn_worker_locked(&self, inner: &mut Inner) -> WorkerId {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let id = WorkerId::sequential(seq);
        inner.workers.insert(id.clone(), Worker::new(id.clone(), self.now()));
        id
    }

    /// Any `error`/`timeout` worker not currently bound to a task
    /// becomes eligible for assignment again (§4.3 diagram: "release
    /// returns worker to idle from error/timeout on next assignment
    /// eligibility check").
    fn reclaim_eligible_locked(inner: &mut Inner) {
        for worker in inner.workers.values_mut() {
            if matches!(worker.state, WorkerState::Error | WorkerState::Timeout) && worker.current_task.is_none() {
                worker.state = WorkerState::Idle;
            }
        }
    }

    /// Pick any idle worker; if none and the pool is under
    /// `max_workers`, spawn one. Returns `NoIdleWorker` if the pool is
    /// already at capacity.
    #[instrument(skip(self, task), fields(cell_id = %task.cell_id))]
    pub fn assign_cell(&self, task: WorkerTask) -> Result<WorkerId, PoolError> {
        let mut inner = self.inner.lock();
        if inner.stopped {
            return Err(PoolError::Stopped);
        }
        Self::reclaim_eligible_locked(&mut inner);

        let idle_id = inner
            .workers
            .values()
            .find(|w| w.state == WorkerState::Idle)
            .map(|w| w.id.clone());

        let worker_id = match idle_id {
            Some(id) => id,
            None if inner.workers.len() < self.config.max_workers as usize => self.spawn_worker_locked(&mut inner),
            None => return Err(PoolError::NoIdleWorker),
        };

        let now = self.now();
        #[allow(clippy::unwrap_used)]
        let worker = inner.workers.get_mut(&worker_id).unwrap();
        worker.worktree_path = task.worktree_path.clone();
        worker.current_task = Some(task);
        worker.state = WorkerState::Busy;
        worker.progress = 0;
        worker.last_heartbeat = now;
        Ok(worker_id)
    }

    fn enqueue(&self, task: WorkerTask) {
        self.inner.lock().queue.push(task);
    }

    pub fn find_worker_for_cell(&self, cell_id: &CellId) -> Option<WorkerId> {
        self.inner
            .lock()
            .workers
            .values()
            .find(|w| w.current_task.as_ref().map(|t| &t.cell_id) == Some(cell_id))
            .map(|w| w.id.clone())
    }

    /// Try to assign immediately; on failure enqueue the task. If
    /// `wait`, poll at 1Hz for up to 60s for the task to land on a
    /// worker (via `release`'s queue drain or task stealing).
    pub fn submit(&self, task: WorkerTask, wait: bool) -> Result<Option<WorkerId>, PoolError> {
        self.submit_with_timeout(task, wait, SUBMIT_WAIT_TIMEOUT)
    }

    pub fn submit_with_timeout(
        &self,
        task: WorkerTask,
        wait: bool,
        timeout: Duration,
    ) -> Result<Option<WorkerId>, PoolError> {
        match self.assign_cell(task.clone()) {
            Ok(id) => return Ok(Some(id)),
            Err(PoolError::Stopped) => return Err(PoolError::Stopped),
            Err(_) => {}
        }
        self.enqueue(task.clone());
        if !wait {
            return Ok(None);
        }
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            std::thread::sleep(SUBMIT_POLL_INTERVAL.min(timeout));
            if let Some(id) = self.find_worker_for_cell(&task.cell_id) {
                return Ok(Some(id));
            }
        }
        Err(PoolError::NoIdleWorker)
    }

    /// Return a worker to `idle`, record its outcome, and immediately
    /// try to assign the head-of-queue task to it.
    #[instrument(skip(self))]
    pub fn release(&self, worker_id: &WorkerId, success: bool) -> Result<(), PoolError> {
        let next_task = {
            let mut inner = self.inner.lock();
            let worker = inner
                .workers
                .get_mut(worker_id)
                .ok_or_else(|| PoolError::UnknownWorker(worker_id.clone()))?;
            if success {
                worker.completed_tasks += 1;
            } else {
                worker.failed_tasks += 1;
            }
            worker.current_task = None;
            worker.state = WorkerState::Idle;
            worker.progress = 0;
            worker.last_heartbeat = self.now();
            inner.queue.pop()
        };
        self.processes.lock().remove(worker_id);
        if let Some(task) = next_task {
            if self.assign_cell(task.clone()).is_err() {
                self.enqueue(task);
            }
        }
        Ok(())
    }

    /// Override the heartbeat staleness threshold used by
    /// [`Self::heartbeat_tick`]. Defaults to `worker_timeout_secs` at
    /// construction; callers that track `pheromone.timeout` separately
    /// should call this once after `new()` to keep liveness detection
    /// driven by that value instead.
    pub fn set_heartbeat_timeout_secs(&self, secs: u64) {
        self.heartbeat_timeout_secs.store(secs, Ordering::SeqCst);
    }

    /// Flip any `busy` worker whose heartbeat has gone stale past the
    /// configured heartbeat timeout to `timeout`, appending an event
    /// record. Returns the flipped worker ids.
    #[instrument(skip(self))]
    pub fn heartbeat_tick(&self, now: u64) -> Vec<WorkerId> {
        let timeout = self.heartbeat_timeout_secs.load(Ordering::SeqCst);
        let mut timed_out = Vec::new();
        {
            let mut inner = self.inner.lock();
            for worker in inner.workers.values_mut() {
                if worker.state == WorkerState::Busy && now.saturating_sub(worker.last_heartbeat) > timeout {
                    worker.state = WorkerState::Timeout;
                    timed_out.push(worker.clone());
                }
            }
        }
        for worker in &timed_out {
            warn!(worker = %worker.id, "worker heartbeat timed out");
            self.append_timeout_event(worker, now);
        }
        timed_out.into_iter().map(|w| w.id).collect()
    }

    fn append_timeout_event(&self, worker: &Worker, now: u64) {
        let Some(path) = &self.event_log_path else {
            return;
        };
        let event = TimeoutEvent {
            worker_id: worker.id.as_str().to_string(),
            cell_id: worker.current_task.as_ref().map(|t| t.cell_id.as_str().to_string()),
            last_heartbeat: worker.last_heartbeat,
            now,
        };
        let Ok(line) = serde_json::to_string(&event) else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{line}");
        }
    }

    /// When enabled, pull pending tasks onto idle workers, highest
    /// priority first. Returns the number of tasks assigned.
    pub fn task_stealing_tick(&self) -> usize {
        if !self.config.task_stealing {
            return 0;
        }
        let mut assigned = 0;
        loop {
            let has_idle = self.inner.lock().workers.values().any(|w| w.state == WorkerState::Idle);
            if !has_idle {
                break;
            }
            let Some(task) = self.inner.lock().queue.pop() else {
                break;
            };
            if self.assign_cell(task.clone()).is_ok() {
                assigned += 1;
            } else {
                self.enqueue(task);
                break;
            }
        }
        assigned
    }

    pub fn attach_process(&self, worker_id: WorkerId, handle: Box<dyn ProcessHandle>) {
        self.processes.lock().insert(worker_id, handle);
    }

    /// Poll the process attached to `worker_id` until it exits or
    /// `deadline` passes. `Ok(None)` means the deadline passed with the
    /// process still running, or nothing is attached.
    pub fn wait_for_exit(&self, worker_id: &WorkerId, deadline: Instant) -> Result<Option<bool>, PoolError> {
        loop {
            let outcome = {
                let mut processes = self.processes.lock();
                match processes.get_mut(worker_id) {
                    Some(handle) => handle
                        .try_wait_success()
                        .map_err(|e| PoolError::io(PathBuf::from(format!("worker {worker_id} process")), e))?,
                    None => return Ok(None),
                }
            };
            if outcome.is_some() {
                return Ok(outcome);
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    /// Move a busy worker to `blocked`, keeping its bound task so a
    /// later `unblock` (or a cell-id lookup) can still find it (§4.4).
    #[instrument(skip(self))]
    pub fn set_blocked(&self, worker_id: &WorkerId) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        let worker = inner
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| PoolError::UnknownWorker(worker_id.clone()))?;
        worker.state = WorkerState::Blocked;
        worker.last_heartbeat = self.now();
        Ok(())
    }

    /// Return a previously blocked worker to `idle`. Unlike `release`,
    /// this records no outcome: a resolved blocker isn't a task result.
    #[instrument(skip(self))]
    pub fn unblock(&self, worker_id: &WorkerId) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        let worker = inner
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| PoolError::UnknownWorker(worker_id.clone()))?;
        worker.state = WorkerState::Idle;
        worker.current_task = None;
        worker.progress = 0;
        worker.last_heartbeat = self.now();
        Ok(())
    }

    /// Flip a worker to `timeout` outside the automatic heartbeat sweep,
    /// for a caller that is itself waiting on the worker's process and
    /// observes the deadline directly.
    #[instrument(skip(self))]
    pub fn mark_timeout(&self, worker_id: &WorkerId) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        let worker = inner
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| PoolError::UnknownWorker(worker_id.clone()))?;
        worker.state = WorkerState::Timeout;
        Ok(())
    }

    /// Signal stop; gracefully terminate every tracked process for
    /// `timeout/2`, then force-kill survivors. Idempotent.
    #[instrument(skip(self))]
    pub fn stop(&self, timeout: Duration) {
        {
            let mut inner = self.inner.lock();
            if inner.stopped {
                return;
            }
            inner.stopped = true;
        }
        let half = timeout / 2;
        let deadline = Instant::now() + half;
        let mut processes = self.processes.lock();
        for (worker_id, handle) in processes.iter_mut() {
            match handle.terminate(deadline) {
                Ok(true) => debug!(worker = %worker_id, "process exited gracefully"),
                Ok(false) => {
                    warn!(worker = %worker_id, "process survived graceful deadline, killing tree");
                    let _ = handle.kill();
                }
                Err(e) => {
                    warn!(worker = %worker_id, error = %e, "terminate failed, killing tree");
                    let _ = handle.kill();
                }
            }
        }
        processes.clear();
        let mut inner = self.inner.lock();
        for worker in inner.workers.values_mut() {
            worker.state = WorkerState::Stopped;
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.lock().stopped
    }

    pub fn get(&self, id: &WorkerId) -> Option<Worker> {
        self.inner.lock().workers.get(id).cloned()
    }

    pub fn all_workers(&self) -> Vec<Worker> {
        self.inner.lock().workers.values().cloned().collect()
    }

    pub fn idle_count(&self) -> usize {
        self.inner.lock().workers.values().filter(|w| w.state == WorkerState::Idle).count()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn queue_len(&self) -> usize {
        self.inner.lock().queue.len()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
