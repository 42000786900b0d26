// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed session data: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "corrupt timeline: event {index} at {time_ms}ms precedes the previous event at {previous_ms}ms"
    )]
    OutOfOrder {
        index: usize,
        time_ms: u64,
        previous_ms: u64,
    },

    #[error("corrupt timeline: event {index} at {time_ms}ms is past the end at {total_ms}ms")]
    PastEnd {
        index: usize,
        time_ms: u64,
        total_ms: u64,
    },

    #[error("no recorded session in {0}")]
    MissingSession(PathBuf),
}

impl TimelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
