use super::*;
use hive_core::{FakeClock, Platform, Priority};
use std::sync::atomic::AtomicBool;
use std::sync::Barrier;

fn config(min: u32, max: u32) -> WorkerPoolConfig {
    WorkerPoolConfig {
        min_workers: min,
        max_workers: max,
        default_workers: min,
        task_stealing: true,
        worker_timeout_secs: 300,
        max_retries: 3,
    }
}

fn task(cell: &str, priority: Priority) -> WorkerTask {
    WorkerTask::new(CellId::parse(cell).unwrap(), priority, 300, Platform::Claude, 0)
}

#[test]
fn new_pool_spawns_min_workers_idle() {
    let pool = WorkerPool::new(config(2, 5), Arc::new(FakeClock::default()), None);
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.idle_count(), 2);
}

#[test]
fn assign_cell_grows_pool_up_to_max() {
    let pool = WorkerPool::new(config(1, 2), Arc::new(FakeClock::default()), None);
    let w1 = pool.assign_cell(task("a", Priority::High)).unwrap();
    let w2 = pool.assign_cell(task("b", Priority::High)).unwrap();
    assert_ne!(w1, w2);
    assert_eq!(pool.len(), 2);
    assert!(matches!(pool.assign_cell(task("c", Priority::High)), Err(PoolError::NoIdleWorker)));
}

#[test]
fn assignment_invariant_current_task_matches_busy() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    let worker = pool.get(&wid).unwrap();
    assert_eq!(worker.state, WorkerState::Busy);
    assert_eq!(worker.current_task.unwrap().cell_id.as_str(), "a");
}

#[test]
fn release_returns_worker_to_idle_and_counts_outcome() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.release(&wid, true).unwrap();
    let worker = pool.get(&wid).unwrap();
    assert_eq!(worker.state, WorkerState::Idle);
    assert_eq!(worker.completed_tasks, 1);
    assert!(worker.current_task.is_none());
}

#[test]
fn release_immediately_drains_queue_head() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    // Pool is at capacity, so submitting "b" enqueues it instead of assigning.
    let submitted = pool.submit(task("b", Priority::High), false).unwrap();
    assert!(submitted.is_none());
    assert_eq!(pool.queue_len(), 1);

    pool.release(&wid, true).unwrap();
    assert_eq!(pool.queue_len(), 0);
    let worker = pool.get(&wid).unwrap();
    assert_eq!(worker.current_task.unwrap().cell_id.as_str(), "b");
}

#[test]
fn error_and_timeout_workers_become_eligible_on_next_assignment_check() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.release(&wid, false).unwrap();
    {
        let mut inner = pool.inner.lock();
        inner.workers.get_mut(&wid).unwrap().state = WorkerState::Error;
    }
    assert!(pool.get(&wid).unwrap().state.is_available());
    let reassigned = pool.assign_cell(task("b", Priority::High)).unwrap();
    assert_eq!(reassigned, wid);
    assert_eq!(pool.get(&wid).unwrap().state, WorkerState::Busy);
}

#[test]
fn heartbeat_tick_flags_stale_busy_worker_as_timeout() {
    let clock = Arc::new(FakeClock::new(1_000));
    let pool = WorkerPool::new(config(1, 1), clock.clone(), None);
    pool.assign_cell(task("a", Priority::High)).unwrap();

    let timed_out = pool.heartbeat_tick(1_000 + 301);
    assert_eq!(timed_out.len(), 1);
    assert_eq!(pool.all_workers()[0].state, WorkerState::Timeout);
}

#[test]
fn set_heartbeat_timeout_secs_overrides_the_construction_default() {
    let clock = Arc::new(FakeClock::new(1_000));
    let pool = WorkerPool::new(config(1, 1), clock.clone(), None);
    pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.set_heartbeat_timeout_secs(30);

    // Stale past the overridden 30s window but well inside the
    // construction-time 300s `worker_timeout_secs` default.
    let timed_out = pool.heartbeat_tick(1_000 + 31);
    assert_eq!(timed_out.len(), 1);
    assert_eq!(pool.all_workers()[0].state, WorkerState::Timeout);
}

#[test]
fn heartbeat_tick_appends_event_log() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("heartbeat_events.jsonl");
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::new(0)), Some(log_path.clone()));
    pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.heartbeat_tick(10_000);
    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("\"cell_id\":\"a\""));
}

#[test]
fn s7_concurrent_dispatch_assigns_exactly_two_of_three() {
    let pool = Arc::new(WorkerPool::new(config(2, 2), Arc::new(FakeClock::default()), None));
    let barrier = Arc::new(Barrier::new(2));
    let results = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for (a, b) in [("a", "b"), ("c", "d")] {
        // Each thread races to assign two cells; across the whole test
        // exactly two distinct workers exist, so exactly two cells
        // should land and the rest stay queued/unassigned.
        let pool = pool.clone();
        let barrier = barrier.clone();
        let results = results.clone();
        let (a, b) = (a.to_string(), b.to_string());
        handles.push(std::thread::spawn(move || {
            barrier.wait();
            let r1 = pool.assign_cell(task(&a, Priority::High));
            let r2 = pool.assign_cell(task(&b, Priority::High));
            results.lock().push(r1.is_ok());
            results.lock().push(r2.is_ok());
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let ok_count = results.lock().iter().filter(|ok| **ok).count();
    assert_eq!(ok_count, 2);

    // No worker bound twice: the set of distinct worker ids holding a
    // current_task has the same size as the number of busy workers.
    let busy: Vec<_> = pool.all_workers().into_iter().filter(|w| w.state == WorkerState::Busy).collect();
    assert_eq!(busy.len(), 2);
    let unique_ids: std::collections::HashSet<_> = busy.iter().map(|w| w.id.clone()).collect();
    assert_eq!(unique_ids.len(), 2);
}

struct MockProcess {
    terminated: Arc<AtomicBool>,
    killed: Arc<AtomicBool>,
    exits_gracefully: bool,
}

impl crate::process::ProcessHandle for MockProcess {
    fn pid(&self) -> u32 {
        1
    }
    fn try_wait_success(&mut self) -> std::io::Result<Option<bool>> {
        Ok(None)
    }
    fn terminate(&mut self, _deadline: Instant) -> std::io::Result<bool> {
        self.terminated.store(true, Ordering::SeqCst);
        Ok(self.exits_gracefully)
    }
    fn kill(&mut self) -> std::io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn stop_kills_tree_when_graceful_termination_fails() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    let terminated = Arc::new(AtomicBool::new(false));
    let killed = Arc::new(AtomicBool::new(false));
    pool.attach_process(
        wid,
        Box::new(MockProcess {
            terminated: terminated.clone(),
            killed: killed.clone(),
            exits_gracefully: false,
        }),
    );
    pool.stop(Duration::from_millis(20));
    assert!(terminated.load(Ordering::SeqCst));
    assert!(killed.load(Ordering::SeqCst));
    assert!(pool.is_stopped());
    assert!(pool.all_workers().iter().all(|w| w.state == WorkerState::Stopped));
}

#[test]
fn stop_is_idempotent() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    pool.stop(Duration::from_millis(10));
    pool.stop(Duration::from_millis(10));
    assert!(pool.is_stopped());
}

#[test]
fn set_blocked_keeps_current_task_and_unblock_clears_it() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.set_blocked(&wid).unwrap();
    let worker = pool.get(&wid).unwrap();
    assert_eq!(worker.state, WorkerState::Blocked);
    assert!(worker.current_task.is_some());
    assert!(worker.invariant_holds());
    assert_eq!(pool.find_worker_for_cell(&CellId::parse("a").unwrap()), Some(wid.clone()));

    pool.unblock(&wid).unwrap();
    let worker = pool.get(&wid).unwrap();
    assert_eq!(worker.state, WorkerState::Idle);
    assert!(worker.current_task.is_none());
    assert!(worker.invariant_holds());
}

#[test]
fn unblock_does_not_touch_outcome_counters() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.set_blocked(&wid).unwrap();
    pool.unblock(&wid).unwrap();
    let worker = pool.get(&wid).unwrap();
    assert_eq!(worker.completed_tasks, 0);
    assert_eq!(worker.failed_tasks, 0);
}

#[test]
fn mark_timeout_flips_state_without_clearing_task() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.mark_timeout(&wid).unwrap();
    let worker = pool.get(&wid).unwrap();
    assert_eq!(worker.state, WorkerState::Timeout);
    assert!(worker.current_task.is_some());
}

#[test]
fn unknown_worker_methods_error() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let bogus = WorkerId::sequential(999);
    assert!(matches!(pool.set_blocked(&bogus), Err(PoolError::UnknownWorker(_))));
    assert!(matches!(pool.unblock(&bogus), Err(PoolError::UnknownWorker(_))));
    assert!(matches!(pool.mark_timeout(&bogus), Err(PoolError::UnknownWorker(_))));
}

struct ExitingProcess {
    polls_remaining: AtomicUsize,
    success: bool,
}

impl crate::process::ProcessHandle for ExitingProcess {
    fn pid(&self) -> u32 {
        1
    }
    fn try_wait_success(&mut self) -> std::io::Result<Option<bool>> {
        if self.polls_remaining.fetch_sub(1, Ordering::SeqCst) == 0 {
            Ok(Some(self.success))
        } else {
            Ok(None)
        }
    }
    fn terminate(&mut self, _deadline: Instant) -> std::io::Result<bool> {
        Ok(true)
    }
    fn kill(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn wait_for_exit_reports_success_once_process_exits() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    pool.attach_process(
        wid.clone(),
        Box::new(ExitingProcess {
            polls_remaining: AtomicUsize::new(1),
            success: true,
        }),
    );
    let result = pool.wait_for_exit(&wid, Instant::now() + Duration::from_secs(5));
    assert_eq!(result.unwrap(), Some(true));
}

#[test]
fn wait_for_exit_times_out_while_process_still_running() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    let terminated = Arc::new(AtomicBool::new(false));
    let killed = Arc::new(AtomicBool::new(false));
    pool.attach_process(
        wid.clone(),
        Box::new(MockProcess {
            terminated,
            killed,
            exits_gracefully: true,
        }),
    );
    let result = pool.wait_for_exit(&wid, Instant::now() + Duration::from_millis(50));
    assert_eq!(result.unwrap(), None);
}

#[test]
fn wait_for_exit_returns_none_without_attached_process() {
    let pool = WorkerPool::new(config(1, 1), Arc::new(FakeClock::default()), None);
    let wid = pool.assign_cell(task("a", Priority::High)).unwrap();
    let result = pool.wait_for_exit(&wid, Instant::now() + Duration::from_millis(10));
    assert_eq!(result.unwrap(), None);
}
