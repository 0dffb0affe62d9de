// SPDX-License-Identifier: MIT

//! The Pheromone Bus: durable, cross-process shared state plus
//! in-process event delivery (§4.1).

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hive_core::Clock;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::entry::{EntryType, PheromoneEntry};
use crate::error::BusError;
use crate::lock;
use crate::state::{HiveStatus, PheromoneState};

const HISTORY_CAPACITY: usize = 1000;
const READ_RETRIES: u32 = 3;
const READ_BACKOFF: Duration = Duration::from_millis(100);

pub type SubscriptionId = u64;

type Callback = Box<dyn Fn(&PheromoneEntry) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    types: Option<Vec<EntryType>>,
    active: bool,
    callback: Callback,
}

/// A shared, file-backed, cross-process event & state channel.
pub struct PheromoneBus {
    hive_id: String,
    state_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    clock: Arc<dyn Clock>,
    history: Mutex<VecDeque<PheromoneEntry>>,
    subscribers: Mutex<Vec<Subscription>>,
    worktrees: Mutex<Vec<PathBuf>>,
    next_subscription_id: AtomicU64,
}

impl PheromoneBus {
    /// `state_path` is typically `<project>/.trellis/pheromone.json`;
    /// the lock file is its sibling `.pheromone.lock`.
    pub fn new(hive_id: impl Into<String>, state_path: PathBuf, clock: Arc<dyn Clock>) -> Self {
        let lock_path = state_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(".pheromone.lock");
        Self {
            hive_id: hive_id.into(),
            state_path,
            lock_path,
            lock_timeout: lock::DEFAULT_TIMEOUT,
            clock,
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            subscribers: Mutex::new(Vec::new()),
            worktrees: Mutex::new(Vec::new()),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    fn now(&self) -> u64 {
        self.clock.unix_secs()
    }

    /// Read the shared state. Atomic rename means this never needs the
    /// bus lock: a reader always observes a prior-complete or
    /// new-complete document.
    #[instrument(skip(self), fields(hive_id = %self.hive_id))]
    pub fn read(&self) -> Result<PheromoneState, BusError> {
        for attempt in 0..READ_RETRIES {
            match fs::read_to_string(&self.state_path) {
                Ok(text) => match serde_json::from_str::<PheromoneState>(&text) {
                    Ok(state) => return Ok(state),
                    Err(e) => {
                        warn!(attempt, error = %e, "shared state corrupt, recreating");
                        let empty = PheromoneState::empty(&self.hive_id);
                        let _ = self.write_raw(&empty);
                        std::thread::sleep(READ_BACKOFF);
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    let empty = PheromoneState::empty(&self.hive_id);
                    self.write_raw(&empty)?;
                    return Ok(empty);
                }
                Err(e) => return Err(BusError::io(self.state_path.clone(), e)),
            }
        }
        Err(BusError::Corrupt {
            path: self.state_path.clone(),
            attempts: READ_RETRIES,
        })
    }

    /// Acquire the bus lock and durably replace the shared state.
    #[instrument(skip(self, state), fields(hive_id = %self.hive_id))]
    pub fn write(&self, state: &PheromoneState) -> Result<(), BusError> {
        let _guard = lock::acquire(&self.lock_path, self.lock_timeout)?;
        self.write_raw(state)
    }

    /// Write without locking; callers that already hold the lock (via
    /// [`Self::mutate`]) use this to avoid a self-deadlock.
    fn write_raw(&self, state: &PheromoneState) -> Result<(), BusError> {
        let dir = self
            .state_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| BusError::io(dir.to_path_buf(), e))?;
        let tmp_name = format!(
            ".{}.tmp-{}",
            self.state_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("pheromone.json"),
            nanoid::nanoid!(8)
        );
        let tmp_path = dir.join(tmp_name);

        let write_result = (|| -> Result<(), BusError> {
            let mut file =
                File::create(&tmp_path).map_err(|e| BusError::io(tmp_path.clone(), e))?;
            let bytes = serde_json::to_vec_pretty(state)?;
            file.write_all(&bytes)
                .map_err(|e| BusError::io(tmp_path.clone(), e))?;
            file.sync_all().map_err(|e| BusError::io(tmp_path.clone(), e))?;
            fs::rename(&tmp_path, &self.state_path)
                .map_err(|e| BusError::io(self.state_path.clone(), e))?;
            Ok(())
        })();

        if write_result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        write_result
    }

    /// Acquire the lock once, read, mutate, and write back atomically.
    fn mutate<T>(&self, f: impl FnOnce(&mut PheromoneState, u64) -> T) -> Result<T, BusError> {
        let _guard = lock::acquire(&self.lock_path, self.lock_timeout)?;
        let mut state = self.read()?;
        let now = self.now();
        let result = f(&mut state, now);
        self.write_raw(&state)?;
        Ok(result)
    }

    /// Create an entry, append it to the live set, record it in the
    /// bounded in-memory history, notify subscribers, and — for
    /// broadcast entries — append it to every registered worktree's
    /// incoming log.
    #[instrument(skip(self, data), fields(hive_id = %self.hive_id, %kind, %source))]
    #[allow(clippy::too_many_arguments)]
    pub fn emit(
        &self,
        kind: EntryType,
        source: impl Into<String> + std::fmt::Display,
        data: Value,
        target: Option<String>,
        ttl: Option<u64>,
        strength: Option<f64>,
    ) -> Result<PheromoneEntry, BusError> {
        let source = source.to_string();
        let entry = self.mutate(|state, now| {
            let entry = PheromoneEntry::new(kind, source, data, target, ttl, strength, now);
            state.pheromones.push(entry.clone());
            entry
        })?;

        self.push_history(entry.clone());
        self.notify_subscribers(&entry);
        if entry.is_broadcast() {
            self.append_to_worktree_logs(&entry);
        }
        debug!("emitted pheromone entry");
        Ok(entry)
    }

    /// Remove entries whose age has reached their ttl; decay the
    /// strength of survivors. Returns the number removed.
    #[instrument(skip(self), fields(hive_id = %self.hive_id))]
    pub fn decay(&self, now: u64) -> Result<usize, BusError> {
        self.mutate(|state, _| {
            let before = state.pheromones.len();
            state.pheromones.retain(|e| !e.is_expired(now));
            for entry in state.pheromones.iter_mut() {
                entry.strength = entry.decayed_strength(now);
            }
            before - state.pheromones.len()
        })
    }

    pub fn emit_blocker(
        &self,
        cell_id: impl Into<String>,
        reason: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<PheromoneEntry, BusError> {
        let cell_id = cell_id.into();
        let reason = reason.into();
        let source = source.into();
        let entry = self.mutate(|state, now| {
            let entry = PheromoneEntry::new(
                EntryType::Blocker,
                source,
                serde_json::json!({"cell_id": cell_id, "reason": reason}),
                Some(cell_id.clone()),
                Some(crate::entry::BLOCKER_TTL_SECS),
                None,
                now,
            );
            state.pheromones.push(entry.clone());
            state.push_blocker(cell_id.clone(), reason.clone(), now);
            entry
        })?;
        self.push_history(entry.clone());
        self.notify_subscribers(&entry);
        Ok(entry)
    }

    pub fn resolve_blocker(
        &self,
        cell_id: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<PheromoneEntry, BusError> {
        let cell_id = cell_id.into();
        let source = source.into();
        let entry = self.mutate(|state, now| {
            let entry = PheromoneEntry::new(
                EntryType::Completion,
                source,
                serde_json::json!({"cell_id": cell_id}),
                Some(cell_id.clone()),
                None,
                None,
                now,
            );
            state
                .pheromones
                .retain(|e| !(e.kind == EntryType::Blocker && e.targets(&cell_id)));
            state.pheromones.push(entry.clone());
            state.clear_blockers_for(&cell_id);
            entry
        })?;
        self.push_history(entry.clone());
        self.notify_subscribers(&entry);
        Ok(entry)
    }

    pub fn subscribe(
        &self,
        types: Option<Vec<EntryType>>,
        callback: impl Fn(&PheromoneEntry) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().push(Subscription {
            id,
            types,
            active: true,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(sub) = self.subscribers.lock().iter_mut().find(|s| s.id == id) {
            sub.active = false;
        }
    }

    pub fn register_worktree(&self, path: PathBuf) {
        self.worktrees.lock().push(path);
    }

    pub fn history(&self) -> Vec<PheromoneEntry> {
        self.history.lock().iter().cloned().collect()
    }

    fn push_history(&self, entry: PheromoneEntry) {
        let mut history = self.history.lock();
        if history.len() >= HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(entry);
    }

    fn notify_subscribers(&self, entry: &PheromoneEntry) {
        let subscribers = self.subscribers.lock();
        for sub in subscribers.iter() {
            if !sub.active {
                continue;
            }
            if let Some(types) = &sub.types {
                if !types.contains(&entry.kind) {
                    continue;
                }
            }
            let callback = &sub.callback;
            if catch_unwind(AssertUnwindSafe(|| callback(entry))).is_err() {
                warn!(subscription = sub.id, "subscriber callback panicked, discarding");
            }
        }
    }

    fn append_to_worktree_logs(&self, entry: &PheromoneEntry) {
        let worktrees = self.worktrees.lock();
        for worktree in worktrees.iter() {
            let log_path = worktree.join(".trellis").join("incoming.jsonl");
            if let Some(parent) = log_path.parent() {
                if fs::create_dir_all(parent).is_err() {
                    continue;
                }
            }
            let line = match serde_json::to_string(entry) {
                Ok(line) => line,
                Err(_) => continue,
            };
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
                let _ = writeln!(file, "{line}");
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
