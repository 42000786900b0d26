// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tracing::{debug, warn};

/// Handle to a running audio process.
#[derive(Debug)]
pub struct AudioProcess {
    pid: u32,
    child: Option<Child>,
}

impl AudioProcess {
    pub fn new(pid: u32, child: Child) -> Self {
        Self {
            pid,
            child: Some(child),
        }
    }

    /// A handle with no child attached, for backends that manage the
    /// process themselves.
    pub fn detached(pid: u32) -> Self {
        Self { pid, child: None }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn child_mut(&mut self) -> Option<&mut Child> {
        self.child.as_mut()
    }
}

/// Suspend `pid` with SIGSTOP.
#[cfg(unix)]
pub fn suspend(pid: u32) -> Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGSTOP)
        .with_context(|| format!("Failed to suspend audio process {pid}"))
}

/// Continue `pid` with SIGCONT.
#[cfg(unix)]
pub fn resume(pid: u32) -> Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGCONT)
        .with_context(|| format!("Failed to resume audio process {pid}"))
}

#[cfg(not(unix))]
pub fn suspend(pid: u32) -> Result<()> {
    anyhow::bail!("suspending audio process {pid} is not supported on this platform")
}

#[cfg(not(unix))]
pub fn resume(pid: u32) -> Result<()> {
    anyhow::bail!("resuming audio process {pid} is not supported on this platform")
}

/// Stop a process: continue it if suspended, write `q` to its stdin, and
/// kill it if it has not exited within `grace`.
pub async fn terminate(mut process: AudioProcess, grace: Duration) -> Result<()> {
    let pid = process.pid;
    let Some(child) = process.child.as_mut() else {
        return Ok(());
    };

    // A stopped process never reads its stdin.
    if let Err(e) = resume(pid) {
        debug!(pid, error = %e, "continue before terminate failed");
    }

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(b"q").await {
            debug!(pid, error = %e, "audio process stdin already closed");
        }
        drop(stdin);
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => {
            let status = status.with_context(|| format!("Failed to wait for audio process {pid}"))?;
            debug!(pid, %status, "audio process exited");
        }
        Err(_) => {
            warn!(pid, grace_ms = grace.as_millis() as u64, "audio process ignored quit, killing");
            child
                .kill()
                .await
                .with_context(|| format!("Failed to kill audio process {pid}"))?;
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn_sleeper() -> AudioProcess {
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        AudioProcess::new(pid, child)
    }

    #[codio_test_utils::logged_tokio_test]
    async fn terminate_kills_process_that_ignores_quit() {
        let mut process = spawn_sleeper();
        let pid = process.pid();
        suspend(pid).unwrap();
        resume(pid).unwrap();
        assert!(process.child_mut().unwrap().try_wait().unwrap().is_none());

        terminate(process, Duration::from_millis(50)).await.unwrap();
    }

    #[codio_test_utils::logged_tokio_test]
    async fn terminate_detached_is_noop() {
        terminate(AudioProcess::detached(42), Duration::from_millis(1))
            .await
            .unwrap();
    }
}
