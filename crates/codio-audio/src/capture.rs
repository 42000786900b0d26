// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::process::{self, AudioProcess};

/// Records narration into a file.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing into `destination`, returning the process handle and
    /// the start delay in milliseconds.
    async fn record(&self, destination: &Path) -> Result<(AudioProcess, u64)>;

    async fn pause(&self, pid: u32) -> Result<()>;

    async fn resume(&self, pid: u32) -> Result<()>;

    /// Stop capturing and let the backend finish writing the file.
    async fn stop(&self, pid: u32, process: AudioProcess) -> Result<()>;
}

/// Captures through `ffmpeg` from a platform input device.
#[derive(Debug, Clone)]
pub struct FfmpegCapture {
    program: String,
    input_format: String,
    input_device: String,
    finish_grace: Duration,
}

impl FfmpegCapture {
    pub fn new(
        program: impl Into<String>,
        input_format: impl Into<String>,
        input_device: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            input_format: input_format.into(),
            input_device: input_device.into(),
            finish_grace: Duration::from_secs(3),
        }
    }

    fn command(&self, destination: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["-hide_banner", "-loglevel", "error", "-y", "-f"])
            .arg(&self.input_format)
            .arg("-i")
            .arg(&self.input_device)
            .arg(destination)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl CaptureBackend for FfmpegCapture {
    async fn record(&self, destination: &Path) -> Result<(AudioProcess, u64)> {
        let started = Instant::now();
        let child = self
            .command(destination)
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.program))?;
        let pid = child
            .id()
            .context("Capture process exited before reporting a pid")?;
        let start_delay_ms = started.elapsed().as_millis() as u64;

        debug!(
            pid,
            start_delay_ms,
            format = %self.input_format,
            device = %self.input_device,
            "audio capture started"
        );
        Ok((AudioProcess::new(pid, child), start_delay_ms))
    }

    async fn pause(&self, pid: u32) -> Result<()> {
        process::suspend(pid)
    }

    async fn resume(&self, pid: u32) -> Result<()> {
        process::resume(pid)
    }

    async fn stop(&self, pid: u32, process: AudioProcess) -> Result<()> {
        debug!(pid, "stopping audio capture");
        // ffmpeg treats `q` on stdin as a request to finalize the output.
        process::terminate(process, self.finish_grace).await
    }
}
