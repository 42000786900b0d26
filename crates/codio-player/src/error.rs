// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use codio_timeline::TimelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconstructError {
    /// The timeline references documents but none exist in the workspace.
    #[error("none of the {referenced} documents in the recording resolve in this workspace")]
    NothingResolved { referenced: usize },

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("invalid subtitle timestamp {value:?} on line {line}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("failed to read subtitles: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to load session: {0}")]
    Load(#[from] ReconstructError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error("player session has ended")]
    SessionClosed,
}
