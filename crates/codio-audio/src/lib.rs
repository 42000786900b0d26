// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Narration audio through external processes.
//!
//! Playback and capture both run as child processes (`ffplay` and `ffmpeg`
//! by default). They are paused and resumed with job-control signals and
//! stopped by asking them to quit before killing them. The traits here are
//! the seams the player and recorder depend on, so tests substitute fakes
//! and other hosts can plug in their own players.

pub mod capture;
pub mod playback;
pub mod process;

pub use capture::{CaptureBackend, FfmpegCapture};
pub use playback::{FfplayBackend, PlaybackBackend};
pub use process::AudioProcess;
