// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use codio_audio::{AudioProcess, PlaybackBackend};
use tracing::{debug, info};

use crate::tracks::AudioTrack;

/// [`AudioTrack`] over an external playback process.
///
/// Owns at most one process. Resuming at the offset it was paused at
/// continues that process; any other offset restarts playback there.
pub struct AudioPlayer {
    backend: Arc<dyn PlaybackBackend>,
    source: PathBuf,
    process: Option<AudioProcess>,
    paused_at_ms: Option<u64>,
}

impl AudioPlayer {
    pub fn new(backend: Arc<dyn PlaybackBackend>, source: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            source: source.into(),
            process: None,
            paused_at_ms: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.process.is_some()
    }

    async fn release(&mut self) -> Result<()> {
        self.paused_at_ms = None;
        match self.process.take() {
            Some(process) => self.backend.stop(process.pid(), process).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AudioTrack for AudioPlayer {
    async fn play(&mut self, offset_ms: u64) -> Result<()> {
        let pid = self.process.as_ref().map(AudioProcess::pid);
        if let (Some(pid), Some(paused_at)) = (pid, self.paused_at_ms) {
            if paused_at == offset_ms {
                self.backend.resume(pid).await?;
                self.paused_at_ms = None;
                debug!(pid, offset_ms, "audio resumed");
                return Ok(());
            }
        }

        self.release().await?;
        let (process, start_delay_ms) = self
            .backend
            .start(&self.source, offset_ms as f64 / 1000.0)
            .await?;
        info!(pid = process.pid(), offset_ms, start_delay_ms, "audio started");
        self.process = Some(process);
        Ok(())
    }

    async fn pause(&mut self, offset_ms: u64) -> Result<()> {
        let Some(pid) = self.process.as_ref().map(AudioProcess::pid) else {
            return Ok(());
        };
        if self.paused_at_ms.is_none() {
            self.backend.pause(pid).await?;
            self.paused_at_ms = Some(offset_ms);
            debug!(pid, offset_ms, "audio paused");
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.release().await
    }
}
