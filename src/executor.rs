use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::process::Command as TokioCommand;

use crate::error::{Result, TaipoError, EXIT_NOT_RUN};

/// Terminal result of one run. `ran == false` means nothing was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub ran: bool,
    pub exit_code: i32,
    pub succeeded: bool,
}

impl ExecutionOutcome {
    pub fn not_run() -> Self {
        Self {
            ran: false,
            exit_code: EXIT_NOT_RUN,
            succeeded: false,
        }
    }

    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            ran: true,
            exit_code,
            succeeded: exit_code == 0,
        }
    }

    /// Exit status for this process: 0, the command's own code, or 127 when nothing ran.
    pub fn process_exit_code(&self) -> i32 {
        if self.ran {
            self.exit_code
        } else {
            EXIT_NOT_RUN
        }
    }
}

static FOREGROUND_CHILDREN: AtomicUsize = AtomicUsize::new(0);

/// True while a corrected command owns the terminal. Ctrl+C then belongs to the child.
pub fn child_in_foreground() -> bool {
    FOREGROUND_CHILDREN.load(Ordering::SeqCst) > 0
}

struct ForegroundGuard;

impl ForegroundGuard {
    fn enter() -> Self {
        FOREGROUND_CHILDREN.fetch_add(1, Ordering::SeqCst);
        ForegroundGuard
    }
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        FOREGROUND_CHILDREN.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs a command line and reports how it exited.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, command_line: &str) -> Result<ExecutionOutcome>;
}

/// Runs commands through the host shell with the terminal attached.
pub struct CommandExecutor {
    shell: String,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        let shell = std::env::var("SHELL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "/bin/sh".to_string());
        Self { shell }
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }
}

impl CommandRunner for CommandExecutor {
    async fn run(&self, command_line: &str) -> Result<ExecutionOutcome> {
        log::debug!("Spawning command: {} -c '{}'", self.shell, command_line);

        let _foreground = ForegroundGuard::enter();
        let status = TokioCommand::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| TaipoError::ExecutionError {
                message: format!("failed to start {}: {}", self.shell, e),
                source: Some(Box::new(e)),
            })?;

        Ok(ExecutionOutcome::from_exit_code(exit_code_of(status)))
    }
}

/// Signal deaths map to `128 + signal`, as a shell would report them.
fn exit_code_of(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}
