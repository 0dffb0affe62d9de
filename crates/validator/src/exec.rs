// SPDX-License-Identifier: MIT

//! Whitelisted external command execution (§6): a fixed argument
//! vector, never a shell, bounded by a 120s timeout per invocation.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::time::Duration;

pub const SUBCHECK_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pnpm,
    Npm,
}

impl PackageManager {
    /// `pnpm` if the project carries its lockfile, else `npm`.
    pub fn detect(project_root: &Path) -> Self {
        if project_root.join("pnpm-lock.yaml").exists() {
            PackageManager::Pnpm
        } else {
            PackageManager::Npm
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            PackageManager::Pnpm => "pnpm",
            PackageManager::Npm => "npm",
        }
    }

    pub fn lint_args(self) -> Vec<&'static str> {
        vec!["run", "lint"]
    }

    pub fn typecheck_args(self) -> Vec<&'static str> {
        vec!["run", "typecheck"]
    }

    pub fn test_args(self) -> Vec<&'static str> {
        vec!["test"]
    }

    pub fn audit_args(self) -> Vec<&'static str> {
        vec!["audit"]
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub passed: bool,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Run `program args...` in `cwd`, bounded by `timeout`. `passed` is
/// true iff the process exits with code 0 within the deadline; a
/// process that overruns the deadline is killed and reported as a
/// (non-passing) timeout rather than propagating an error, since a
/// stuck linter is an expected validation outcome, not a fault.
pub fn run_whitelisted(program: &str, args: &[&str], cwd: &Path, timeout: Duration) -> CommandResult {
    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match child {
        Ok(child) => child,
        Err(e) => {
            return CommandResult {
                passed: false,
                stdout: String::new(),
                stderr: e.to_string(),
                timed_out: false,
            }
        }
    };

    let (tx, rx) = mpsc::channel();
    let wait_handle = std::thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });
    // wait_with_output consumes child; recv from the channel instead of
    // joining, so a timeout can return without blocking on the thread.
    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) => to_result(output, false),
        Ok(Err(e)) => CommandResult {
            passed: false,
            stdout: String::new(),
            stderr: e.to_string(),
            timed_out: false,
        },
        Err(_) => {
            // The spawned thread is still blocked in wait_with_output;
            // it will finish (and its result is discarded) once the
            // child eventually exits or is reaped by the OS.
            drop(wait_handle);
            CommandResult {
                passed: false,
                stdout: String::new(),
                stderr: format!("timed out after {}s", timeout.as_secs()),
                timed_out: true,
            }
        }
    }
}

fn to_result(output: Output, timed_out: bool) -> CommandResult {
    CommandResult {
        passed: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        timed_out,
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
