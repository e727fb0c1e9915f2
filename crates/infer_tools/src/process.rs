//! Execution of external toolchain processes with a hard time bound.
//!
//! Children run in their own process group on unix. When the time bound is
//! exceeded the whole group is killed, so helpers spawned by a wrapper script
//! cannot outlive the job and write into its directory afterwards.
//!
//! The functions block the caller on a private current-thread runtime and must
//! not be called from inside another tokio runtime.

use std::fs::File;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tracing::{debug, warn};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, `None` when killed by a signal or by the timeout.
    pub status: Option<i32>,
    /// True if the child was killed because it exceeded the time bound.
    pub timed_out: bool,
}

impl ProcessOutcome {
    /// Returns true if the child exited with status zero.
    pub fn success(&self) -> bool {
        !self.timed_out && self.status == Some(0)
    }

    fn exited(status: ExitStatus) -> Self {
        Self {
            status: status.code(),
            timed_out: false,
        }
    }

    fn killed() -> Self {
        Self {
            status: None,
            timed_out: true,
        }
    }
}

/// Runs `command` to completion, writing its stdout and stderr to `log_path`.
///
/// The child's process group is killed once `timeout` has elapsed. The
/// working directory must already be set on `command`; the current process's
/// directory is never changed.
///
/// # Errors
///
/// Returns an I/O error if the log cannot be created or the child cannot be
/// spawned.
pub fn run_logged(
    mut command: Command,
    log_path: &Path,
    timeout: Duration,
) -> std::io::Result<ProcessOutcome> {
    let log = File::create(log_path)?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(log.try_clone()?))
        .stderr(Stdio::from(log));
    own_process_group(&mut command);

    debug!(command = ?command, log = %log_path.display(), "spawning");
    runtime()?.block_on(async {
        let mut child = spawn(command)?;
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Ok(ProcessOutcome::exited(status?)),
            Err(_) => {
                kill_group(&mut child, timeout).await;
                Ok(ProcessOutcome::killed())
            }
        }
    })
}

/// Runs `command` to completion and returns its trimmed stdout.
///
/// Intended for short queries such as `--version`; stderr is discarded. The
/// time bound covers reading stdout as well, so a grandchild holding the pipe
/// open cannot stall the caller. A timed-out query yields empty output.
pub fn run_captured(
    mut command: Command,
    timeout: Duration,
) -> std::io::Result<(ProcessOutcome, String)> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    own_process_group(&mut command);

    debug!(command = ?command, "spawning");
    runtime()?.block_on(async {
        let mut child = spawn(command)?;
        let stdout = child.stdout.take();
        let waiting = &mut child;
        let collect = async move {
            let mut bytes = Vec::new();
            if let Some(mut pipe) = stdout {
                pipe.read_to_end(&mut bytes).await?;
            }
            let status = waiting.wait().await?;
            Ok::<_, std::io::Error>((status, bytes))
        };

        let finished = tokio::time::timeout(timeout, collect).await;
        match finished {
            Ok(collected) => {
                let (status, bytes) = collected?;
                let output = String::from_utf8_lossy(&bytes).trim().to_string();
                Ok((ProcessOutcome::exited(status), output))
            }
            Err(_) => {
                kill_group(&mut child, timeout).await;
                Ok((ProcessOutcome::killed(), String::new()))
            }
        }
    })
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn spawn(command: Command) -> std::io::Result<Child> {
    tokio::process::Command::from(command)
        .kill_on_drop(true)
        .spawn()
}

/// Makes the child the leader of a new process group.
#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

#[cfg(unix)]
async fn kill_process_group(pid: u32) {
    let killed = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(format!("kill -s KILL -- -{pid}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match killed {
        Ok(status) if status.success() => {}
        Ok(status) => debug!(pid, %status, "process group kill failed"),
        Err(e) => debug!(pid, error = %e, "cannot run kill"),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: u32) {}

/// Kills the child and everything in its process group, then reaps it.
async fn kill_group(child: &mut Child, timeout: Duration) {
    warn!(pid = child.id(), timeout_secs = timeout.as_secs_f64(), "killing child after timeout");

    if let Some(pid) = child.id() {
        kill_process_group(pid).await;
    }

    // The leader may already be gone; only reaping matters then.
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "kill of child failed");
    }
    if let Err(e) = child.wait().await {
        debug!(error = %e, "cannot reap killed child");
    }
}
