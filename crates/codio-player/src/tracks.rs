// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Time-based tracks the player keeps in step with the editor.

use async_trait::async_trait;
use tokio::time::Instant;

/// Narration playback.
///
/// Failures are reported but never stop the rest of playback.
#[async_trait]
pub trait AudioTrack: Send {
    /// Start or continue playback at `offset_ms`.
    async fn play(&mut self, offset_ms: u64) -> anyhow::Result<()>;

    /// Pause at `offset_ms`. A later `play` at the same offset continues
    /// the paused output instead of restarting it.
    async fn pause(&mut self, offset_ms: u64) -> anyhow::Result<()>;

    /// Release the output. Safe to call when nothing is playing.
    async fn stop(&mut self) -> anyhow::Result<()>;
}

/// Captions.
pub trait SubtitleTrack: Send {
    /// Show captions from `offset_ms`, where `anchor` is the instant that
    /// corresponds to `offset_ms`.
    fn play(&mut self, offset_ms: u64, anchor: Instant);

    /// Freeze the current caption.
    fn pause(&mut self);

    /// Clear the caption.
    fn stop(&mut self);
}
