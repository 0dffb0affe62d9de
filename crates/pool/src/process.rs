// SPDX-License-Identifier: MIT

//! `ProcessHandle`: a single process-tree-teardown capability with two
//! OS-family backends selected at compile time (§9 REDESIGN FLAGS:
//! "Subprocess cleanup that differs by operating-system family -> a
//! single 'process tree teardown' capability with two backends... the
//! component API exposes only `terminate(deadline)` and `kill()`").

use std::process::Child;
use std::time::{Duration, Instant};

/// A spawned external agent process, killable as a whole tree.
pub trait ProcessHandle: Send {
    fn pid(&self) -> u32;

    /// Non-blocking poll: `Some(true)` if it exited successfully.
    fn try_wait_success(&mut self) -> std::io::Result<Option<bool>>;

    /// Ask the process group to exit, then poll until `deadline` or
    /// exit, whichever comes first. Returns `true` if it exited.
    fn terminate(&mut self, deadline: Instant) -> std::io::Result<bool>;

    /// Unconditionally kill the entire process tree.
    fn kill(&mut self) -> std::io::Result<()>;
}

/// The real backend wrapping a `std::process::Child` spawned into its
/// own process group (unix) so the whole tree can be torn down.
pub struct ChildProcessHandle {
    child: Child,
}

impl ChildProcessHandle {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl ProcessHandle for ChildProcessHandle {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn try_wait_success(&mut self) -> std::io::Result<Option<bool>> {
        Ok(self.child.try_wait()?.map(|status| status.success()))
    }

    fn terminate(&mut self, deadline: Instant) -> std::io::Result<bool> {
        unix_or_other::send_terminate(&self.child)?;
        while Instant::now() < deadline {
            if self.child.try_wait()?.is_some() {
                return Ok(true);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        Ok(false)
    }

    fn kill(&mut self) -> std::io::Result<()> {
        unix_or_other::kill_tree(&self.child)
    }
}

#[cfg(unix)]
mod unix_or_other {
    use std::process::Child;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    pub fn send_terminate(child: &Child) -> std::io::Result<()> {
        let pgid = Pid::from_raw(child.id() as i32);
        let _ = killpg(pgid, Signal::SIGTERM);
        Ok(())
    }

    pub fn kill_tree(child: &Child) -> std::io::Result<()> {
        let pgid = Pid::from_raw(child.id() as i32);
        let _ = killpg(pgid, Signal::SIGKILL);
        Ok(())
    }
}

#[cfg(not(unix))]
mod unix_or_other {
    use std::process::Child;

    pub fn send_terminate(child: &Child) -> std::io::Result<()> {
        // No graceful-termination primitive without FFI on this target;
        // recursive task kill (`taskkill /T /F`) is the only tier.
        kill_tree(child)
    }

    pub fn kill_tree(child: &Child) -> std::io::Result<()> {
        let _ = std::process::Command::new("taskkill")
            .args(["/PID", &child.id().to_string(), "/T", "/F"])
            .output();
        Ok(())
    }
}

/// Spawn `program` with `args` in `cwd`, placed in its own process
/// group on unix so [`ChildProcessHandle::kill`] can tear down the
/// whole tree. Invoked by argument vector, never via a shell (§6).
pub fn spawn(
    program: &str,
    args: &[String],
    cwd: &std::path::Path,
) -> std::io::Result<ChildProcessHandle> {
    let mut command = std::process::Command::new(program);
    command.args(args).current_dir(cwd);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let child = command.spawn()?;
    Ok(ChildProcessHandle::new(child))
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
