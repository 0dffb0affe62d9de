// SPDX-License-Identifier: MIT

//! Process-wide exit-handler registration (§9 REDESIGN FLAGS: "a process
//! can host more than one Queen in tests; shutdown must reach every one
//! of them, not just whichever installed a signal handler last"). Each
//! running [`crate::Queen`] registers its pool here; a process-level
//! shutdown (e.g. a `SIGTERM` handler the CLI installs) drains every
//! registered pool in reverse registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use hive_pool::WorkerPool;

type Entry = (u64, Weak<WorkerPool>);

fn entries() -> &'static Mutex<Vec<Entry>> {
    static ENTRIES: OnceLock<Mutex<Vec<Entry>>> = OnceLock::new();
    ENTRIES.get_or_init(|| Mutex::new(Vec::new()))
}

fn next_token() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::SeqCst)
}

/// Register `pool` for process-wide shutdown, returning a token to pass
/// back to [`unregister`]. Holds only a weak reference: an unregistered,
/// dropped Queen never keeps its pool alive.
pub fn register(pool: &Arc<WorkerPool>) -> u64 {
    let token = next_token();
    entries().lock().push((token, Arc::downgrade(pool)));
    token
}

pub fn unregister(token: u64) {
    entries().lock().retain(|(t, _)| *t != token);
}

/// Stop every still-live registered pool, most-recently-registered
/// first, each bounded by `timeout`.
pub fn shutdown_all(timeout: Duration) {
    let pools: Vec<Arc<WorkerPool>> = entries()
        .lock()
        .iter()
        .rev()
        .filter_map(|(_, weak)| weak.upgrade())
        .collect();
    for pool in pools {
        pool.stop(timeout);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
