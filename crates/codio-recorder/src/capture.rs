// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use codio_audio::{AudioProcess, CaptureBackend};
use tracing::{debug, info};

/// Narration capture into one file, driven by the recorder.
pub struct AudioCapture {
    backend: Arc<dyn CaptureBackend>,
    destination: PathBuf,
    process: Option<AudioProcess>,
    paused: bool,
}

impl AudioCapture {
    pub fn new(backend: Arc<dyn CaptureBackend>, destination: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            destination: destination.into(),
            process: None,
            paused: false,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn is_capturing(&self) -> bool {
        self.process.is_some() && !self.paused
    }

    /// Start capturing. Returns the backend's start delay in milliseconds.
    pub async fn start(&mut self) -> Result<u64> {
        if let Some(parent) = self.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let (process, start_delay_ms) = self.backend.record(&self.destination).await?;
        info!(
            pid = process.pid(),
            destination = %self.destination.display(),
            start_delay_ms,
            "narration capture started"
        );
        self.process = Some(process);
        self.paused = false;
        Ok(start_delay_ms)
    }

    pub async fn pause(&mut self) -> Result<()> {
        let Some(pid) = self.process.as_ref().map(AudioProcess::pid) else {
            return Ok(());
        };
        if !self.paused {
            self.backend.pause(pid).await?;
            self.paused = true;
            debug!(pid, "narration capture paused");
        }
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<()> {
        let Some(pid) = self.process.as_ref().map(AudioProcess::pid) else {
            return Ok(());
        };
        if self.paused {
            self.backend.resume(pid).await?;
            self.paused = false;
            debug!(pid, "narration capture resumed");
        }
        Ok(())
    }

    /// Finish the file. Returns its path if a capture was running.
    pub async fn stop(&mut self) -> Result<Option<PathBuf>> {
        let Some(process) = self.process.take() else {
            return Ok(None);
        };
        self.paused = false;
        let pid = process.pid();
        self.backend.stop(pid, process).await?;
        info!(pid, destination = %self.destination.display(), "narration capture finished");
        Ok(Some(self.destination.clone()))
    }
}
