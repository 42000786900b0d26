// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Recording of coding sessions.
//!
//! A [`Recorder`] stamps editor events pushed into it with the active
//! recording time, so time spent paused never shows up in the timeline.
//! Narration is captured alongside through an [`AudioCapture`] that follows
//! the same start, pause and resume calls.

pub mod capture;
pub mod error;
pub mod recorder;
pub mod save;

pub use capture::AudioCapture;
pub use error::RecorderError;
pub use recorder::{EventSink, Recorder, RecorderState, Recording};
pub use save::save;
