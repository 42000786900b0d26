// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use tokio::time::Instant;

/// The playback position.
///
/// While running, the position is `relative + (now - anchor)`; while
/// stopped it is `relative`. The anchor is only ever taken from the
/// monotonic clock, so the position never moves backwards between
/// explicit seeks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackClock {
    relative_active_ms: u64,
    anchor: Option<Instant>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, now: Instant) -> u64 {
        match self.anchor {
            Some(anchor) => {
                self.relative_active_ms + now.saturating_duration_since(anchor).as_millis() as u64
            }
            None => self.relative_active_ms,
        }
    }

    /// Start running from `from_ms`, anchored at `now`.
    pub fn start(&mut self, from_ms: u64, now: Instant) {
        self.relative_active_ms = from_ms;
        self.anchor = Some(now);
    }

    /// Stop running and fold the elapsed time into the position.
    pub fn freeze(&mut self, now: Instant) -> u64 {
        self.relative_active_ms = self.current(now);
        self.anchor = None;
        self.relative_active_ms
    }

    /// Jump to `ms` without changing whether the clock runs.
    pub fn set(&mut self, ms: u64, now: Instant) {
        self.relative_active_ms = ms;
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<Instant> {
        self.anchor
    }

    pub fn relative_active_ms(&self) -> u64 {
        self.relative_active_ms
    }
}
