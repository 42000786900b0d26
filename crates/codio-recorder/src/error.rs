// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;

use codio_timeline::TimelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("recording already started")]
    AlreadyStarted,

    #[error("not recording")]
    NotRecording,

    #[error("recording already finished")]
    AlreadyFinished,

    #[error("failed to copy narration from {path}")]
    CopyAudio {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}
