// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Replay of recorded coding sessions.
//!
//! A [`Player`] drives three time-based tracks from one [`PlaybackClock`]:
//! the editor reconstruction ([`EditorPlayer`]), optional narration audio
//! and optional captions. A [`ProgressTimer`] reports progress and detects
//! the end of the recording. [`session::spawn`] wraps a player in a task
//! that serializes transport commands, timer ticks and editor deadlines.

pub mod audio;
pub mod clock;
pub mod editor;
pub mod error;
pub mod player;
pub mod session;
pub mod source;
pub mod subtitles;
pub mod timer;
pub mod tracks;

pub use audio::AudioPlayer;
pub use clock::PlaybackClock;
pub use editor::{EditorPlayer, MaterializeStrategy, Materialized};
pub use error::{PlayerError, ReconstructError, SubtitleError};
pub use player::{Player, PlayerContext, PlayerSettings, PlayerState};
pub use session::{PlayerHandle, TransportCommand};
pub use source::{OpenOptions, PlaybackSource};
pub use subtitles::{Cue, Subtitles};
pub use timer::{Progress, ProgressTimer, TimerEvent};
pub use tracks::{AudioTrack, SubtitleTrack};
