//! Scope guard around a spawned backend process.

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use super::error::SupervisorError;
use super::types::CommandSpec;

/// How a [`ProcessHandle`] is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The process is exiting on its own; wait for it until `deadline`,
    /// then kill it.
    Reap { deadline: Instant },
    /// Kill the process (SIGKILL), then wait for it.
    Kill,
}

/// What happened to a released process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// Exited on its own with this status.
    Exited(ExitStatus),
    /// Killed by the supervisor and reaped.
    Killed,
}

/// Owns a running backend process.
///
/// `spawn` is the only way to obtain one and `release` the only way to give
/// it back. A handle dropped without being released (early return, panic,
/// cancelled future) kills its process in `Drop`.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Option<Child>,
    program: PathBuf,
}

impl ProcessHandle {
    /// Spawns the command with stdin closed and both output pipes captured.
    pub fn spawn(
        command: &CommandSpec,
    ) -> Result<(Self, ChildStdout, ChildStderr), SupervisorError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::spawn(&command.program, e))?;

        debug!(pid = ?child.id(), program = %command.program.display(), "Spawned backend");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let handle = Self {
            child: Some(child),
            program: command.program.clone(),
        };

        match (stdout, stderr) {
            (Some(stdout), Some(stderr)) => Ok((handle, stdout, stderr)),
            // Dropping the handle here kills the process.
            _ => Err(SupervisorError::Io(io::Error::new(
                io::ErrorKind::Other,
                "backend output pipes were not captured",
            ))),
        }
    }

    /// Releases the process. This is the only place a process is reaped.
    pub async fn release(mut self, release: Release) -> Result<Released, SupervisorError> {
        let Some(mut child) = self.child.take() else {
            return Err(SupervisorError::Io(io::Error::new(
                io::ErrorKind::Other,
                "process handle already released",
            )));
        };

        if let Release::Reap { deadline } = release {
            match timeout_at(deadline, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    debug!(program = %self.program.display(), ?status, "Backend exited");
                    return Ok(Released::Exited(status));
                }
                Err(_) => {
                    debug!(program = %self.program.display(), "Backend still running at deadline");
                }
            }
        }

        // Fails only if the process is already gone; the wait below reaps it either way.
        if let Err(e) = child.start_kill() {
            debug!(program = %self.program.display(), error = %e, "Kill failed");
        }
        let status = child.wait().await?;
        debug!(program = %self.program.display(), ?status, "Backend killed");
        Ok(Released::Killed)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            warn!(
                program = %self.program.display(),
                pid = ?child.id(),
                "Backend handle dropped without release, killing process"
            );
            let _ = child.start_kill();
        }
    }
}
