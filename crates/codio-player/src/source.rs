// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use std::sync::Arc;

use codio_audio::PlaybackBackend;
use codio_timeline::{FsWorkspace, SessionDir, Timeline, WorkspaceResolver};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::audio::AudioPlayer;
use crate::error::PlayerError;
use crate::subtitles::Subtitles;
use crate::tracks::{AudioTrack, SubtitleTrack};

/// Everything [`crate::Player::load`] needs for one session.
pub struct PlaybackSource {
    pub timeline: Timeline<String>,
    pub workspace: Box<dyn WorkspaceResolver>,
    pub audio: Option<Box<dyn AudioTrack>>,
    pub subtitles: Option<Box<dyn SubtitleTrack>>,
    pub captions: Option<watch::Receiver<Option<String>>>,
}

/// How [`PlaybackSource::open`] assembles a session from disk.
#[derive(Default, Clone)]
pub struct OpenOptions {
    /// Replay against this directory instead of the session's own copy.
    pub workspace: Option<PathBuf>,
    /// Backend for the narration track; `None` plays silently.
    pub audio: Option<Arc<dyn PlaybackBackend>>,
    pub subtitles: bool,
}

impl PlaybackSource {
    pub fn new(timeline: Timeline<String>, workspace: impl WorkspaceResolver + 'static) -> Self {
        Self {
            timeline,
            workspace: Box::new(workspace),
            audio: None,
            subtitles: None,
            captions: None,
        }
    }

    pub fn with_audio(mut self, audio: impl AudioTrack + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    pub fn with_subtitles(mut self, subtitles: Subtitles) -> Self {
        self.captions = Some(subtitles.subscribe());
        self.subtitles = Some(Box::new(subtitles));
        self
    }

    /// Read a session directory.
    ///
    /// The timeline is required. Narration and captions are attached when
    /// their files exist and they are enabled; a caption file that fails to
    /// parse is skipped with a warning.
    pub async fn open(session: &SessionDir, options: OpenOptions) -> Result<Self, PlayerError> {
        let timeline = session.load_timeline().await?;
        let root = options
            .workspace
            .unwrap_or_else(|| session.workspace_dir());
        debug!(workspace = %root.display(), "binding session to workspace");
        let mut source = Self::new(timeline, FsWorkspace::new(root));

        if let Some(backend) = options.audio {
            if let Some(path) = SessionDir::existing(session.audio_path()).await {
                source = source.with_audio(AudioPlayer::new(backend, path));
            }
        }

        if options.subtitles {
            if let Some(path) = SessionDir::existing(session.subtitles_path()).await {
                match Subtitles::load(&path).await {
                    Ok(subtitles) => source = source.with_subtitles(subtitles),
                    Err(e) => warn!(error = %e, path = %path.display(), "ignoring subtitles"),
                }
            }
        }

        Ok(source)
    }
}
