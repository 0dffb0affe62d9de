// SPDX-License-Identifier: MIT

//! Fixed per-platform agent launch templates (§6): argument vectors
//! only, never built through a shell.

use hive_core::Platform;

/// The program and fixed argument vector for launching `platform`'s
/// agent against a task directory. The task directory itself is
/// communicated to the agent via the `.current-task` sentinel file
/// (§4.4), not as a command-line argument.
pub fn agent_command(platform: Platform) -> (&'static str, Vec<String>) {
    match platform {
        Platform::Claude => (
            "claude",
            vec!["--print".to_string(), "--dangerously-skip-permissions".to_string()],
        ),
        Platform::Opencode => ("opencode", vec!["run".to_string()]),
        Platform::Cursor => ("cursor-agent", vec!["--non-interactive".to_string()]),
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
