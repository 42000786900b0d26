// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use codio_timeline::{Metadata, SessionDir, WorkspaceResolver};
use tracing::info;

use crate::error::RecorderError;
use crate::recorder::Recording;

/// Write `recording` as a session directory.
///
/// Documents are stored relative to `workspace`; anything outside it is
/// dropped. The narration file is copied in unless it was captured in
/// place.
pub async fn save(
    recording: Recording,
    workspace: &dyn WorkspaceResolver,
    session: &SessionDir,
    name: &str,
) -> Result<Metadata, RecorderError> {
    let timeline = recording.timeline.relativize(workspace);
    let metadata = Metadata::new(name, timeline.total_duration_ms);
    session.save(&metadata, &timeline).await?;
    let snapshot_files = session.write_workspace_snapshot(&timeline).await?;

    if let Some(audio) = recording.audio {
        let target = session.audio_path();
        if audio != target {
            tokio::fs::copy(&audio, &target)
                .await
                .map_err(|source| RecorderError::CopyAudio {
                    path: audio.clone(),
                    source,
                })?;
        }
    }

    info!(
        root = %session.root().display(),
        name,
        total_ms = metadata.length,
        events = timeline.events.len(),
        snapshot_files,
        "session saved"
    );
    Ok(metadata)
}
