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

/// Plays an audio file from an offset.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Start playing `source` at `offset_secs`.
    ///
    /// Returns the process handle and how long the backend took to start,
    /// in milliseconds.
    async fn start(&self, source: &Path, offset_secs: f64) -> Result<(AudioProcess, u64)>;

    async fn pause(&self, pid: u32) -> Result<()>;

    async fn resume(&self, pid: u32) -> Result<()>;

    async fn stop(&self, pid: u32, process: AudioProcess) -> Result<()>;
}

/// Plays through `ffplay` with no display window.
#[derive(Debug, Clone)]
pub struct FfplayBackend {
    program: String,
}

impl FfplayBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, source: &Path, offset_secs: f64) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["-nodisp", "-autoexit", "-loglevel", "quiet", "-ss"])
            .arg(format!("{:.3}", offset_secs.max(0.0)))
            .arg(source)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl Default for FfplayBackend {
    fn default() -> Self {
        Self::new("ffplay")
    }
}

#[async_trait]
impl PlaybackBackend for FfplayBackend {
    async fn start(&self, source: &Path, offset_secs: f64) -> Result<(AudioProcess, u64)> {
        let started = Instant::now();
        let child = self
            .command(source, offset_secs)
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.program))?;
        let pid = child
            .id()
            .context("Audio process exited before reporting a pid")?;
        let start_delay_ms = started.elapsed().as_millis() as u64;

        debug!(
            pid,
            offset_secs,
            start_delay_ms,
            source = %source.display(),
            "audio playback started"
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
        debug!(pid, "stopping audio playback");
        // ffplay only reads keys from its window, so there is no point waiting.
        process::terminate(process, Duration::ZERO).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[codio_test_utils::logged_test]
    fn command_line_seeks_and_hides_display() {
        let backend = FfplayBackend::new("ffplay");
        let command = backend.command(Path::new("/tmp/audio.mp3"), 12.5);
        let std = command.as_std();
        let args: Vec<_> = std.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(std.get_program(), "ffplay");
        assert_eq!(
            args,
            ["-nodisp", "-autoexit", "-loglevel", "quiet", "-ss", "12.500", "/tmp/audio.mp3"]
        );
    }

    #[codio_test_utils::logged_tokio_test]
    async fn missing_program_reports_launch_failure() {
        let backend = FfplayBackend::new("/nonexistent/codio-ffplay");
        let err = backend
            .start(Path::new("audio.mp3"), 0.0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to launch"));
    }
}
