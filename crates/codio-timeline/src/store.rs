// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! On-disk layout of a recorded session.
//!
//! ```text
//! <session>/
//! ├── codio.json      metadata
//! ├── timeline.json   initial frame and event log
//! ├── audio.mp3       narration (optional)
//! ├── subtitles.srt   captions (optional)
//! └── workspace/      copy of the recorded documents
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::TimelineError;
use crate::timeline::Timeline;
use crate::workspace::{FsWorkspace, WorkspaceResolver};

pub const METADATA_FILE: &str = "codio.json";
pub const TIMELINE_FILE: &str = "timeline.json";
pub const AUDIO_FILE: &str = "audio.mp3";
pub const SUBTITLES_FILE: &str = "subtitles.srt";
pub const WORKSPACE_DIR: &str = "workspace";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    /// Total duration in milliseconds.
    pub length: u64,
    /// Version of the tool that wrote the session.
    pub version: String,
}

impl Metadata {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A session directory.
#[derive(Debug, Clone)]
pub struct SessionDir {
    root: PathBuf,
}

impl SessionDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn timeline_path(&self) -> PathBuf {
        self.root.join(TIMELINE_FILE)
    }

    pub fn audio_path(&self) -> PathBuf {
        self.root.join(AUDIO_FILE)
    }

    pub fn subtitles_path(&self) -> PathBuf {
        self.root.join(SUBTITLES_FILE)
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// `path` if it exists, for the optional tracks.
    pub async fn existing(path: PathBuf) -> Option<PathBuf> {
        fs::try_exists(&path).await.ok()?.then_some(path)
    }

    pub async fn load_timeline(&self) -> Result<Timeline<String>, TimelineError> {
        let path = self.timeline_path();
        let json = read_session_file(&self.root, &path).await?;
        let timeline = Timeline::from_json(&json)?;
        debug!(
            path = %path.display(),
            events = timeline.events.len(),
            total_ms = timeline.total_duration_ms,
            "loaded timeline"
        );
        Ok(timeline)
    }

    pub async fn load_metadata(&self) -> Result<Metadata, TimelineError> {
        let json = read_session_file(&self.root, &self.metadata_path()).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write metadata and timeline, creating the directory if needed.
    pub async fn save(
        &self,
        metadata: &Metadata,
        timeline: &Timeline<String>,
    ) -> Result<(), TimelineError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| TimelineError::io(&self.root, e))?;

        let metadata_path = self.metadata_path();
        fs::write(&metadata_path, serde_json::to_vec_pretty(metadata)?)
            .await
            .map_err(|e| TimelineError::io(&metadata_path, e))?;

        let timeline_path = self.timeline_path();
        fs::write(&timeline_path, timeline.to_json_pretty()?)
            .await
            .map_err(|e| TimelineError::io(&timeline_path, e))?;

        debug!(
            root = %self.root.display(),
            events = timeline.events.len(),
            "saved session"
        );
        Ok(())
    }

    /// Copy the initial snapshot into `workspace/` so the session replays
    /// without the original checkout. Returns the number of files written.
    pub async fn write_workspace_snapshot(
        &self,
        timeline: &Timeline<String>,
    ) -> Result<usize, TimelineError> {
        let workspace = FsWorkspace::new(self.workspace_dir());
        let mut written = 0;
        for file in &timeline.initial_frame {
            let Some(target) = workspace.resolve(&file.document) else {
                continue;
            };
            let target = target.path();
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TimelineError::io(parent, e))?;
            }
            fs::write(target, file.text.text())
                .await
                .map_err(|e| TimelineError::io(target, e))?;
            written += 1;
        }
        Ok(written)
    }
}

async fn read_session_file(root: &Path, path: &Path) -> Result<String, TimelineError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TimelineError::MissingSession(root.to_path_buf()))
        }
        Err(e) => Err(TimelineError::io(path, e)),
    }
}

/// Packs session directories into single-file archives and back.
///
/// The archive format is left to implementors.
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn pack(&self, session: &SessionDir, archive: &Path) -> anyhow::Result<()>;

    async fn unpack(&self, archive: &Path, destination: &Path) -> anyhow::Result<SessionDir>;
}
