// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use codio_audio::FfmpegCapture;
use codio_config::CodioConfig;
use codio_recorder::{AudioCapture, Recorder, save};
use codio_timeline::{DocumentId, EventKind, FrameFile, FsWorkspace, SessionDir, ViewColumn, WorkspaceResolver};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::format_offset;

#[derive(Args)]
pub struct RecordArgs {
    /// Workspace the recorded documents live in
    pub workspace: PathBuf,

    /// Session directory to write
    #[arg(long)]
    pub out: PathBuf,

    /// Session name (defaults to the output directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Workspace-relative documents open when recording starts
    #[arg(long)]
    pub open: Vec<String>,

    /// Record without narration
    #[arg(long)]
    pub no_audio: bool,
}

/// One line of recorder input.
#[derive(Debug, PartialEq)]
pub enum RecordInput {
    Pause,
    Resume,
    Finish,
    Event(EventKind<String>),
}

impl RecordInput {
    /// Control words, or one JSON editor event with workspace-relative paths.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(match line.trim() {
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "finish" => Self::Finish,
            json => Self::Event(serde_json::from_str(json).context("invalid editor event")?),
        })
    }
}

impl RecordArgs {
    pub async fn run(&self, config: &CodioConfig) -> Result<()> {
        let workspace = FsWorkspace::new(&self.workspace);
        let session = SessionDir::new(&self.out);

        let mut recorder = Recorder::new();
        if config.recorder.audio && !self.no_audio {
            let backend = FfmpegCapture::new(
                &config.audio.capture_program,
                &config.audio.input_format,
                &config.audio.input_device,
            );
            recorder = recorder.with_audio(AudioCapture::new(Arc::new(backend), session.audio_path()));
        }

        recorder.start(self.initial_frame(&workspace).await?).await?;
        eprintln!("recording; send editor events as JSON lines, `pause`, `resume` or `finish`");
        feed(&mut recorder, &workspace, BufReader::new(tokio::io::stdin())).await?;

        let recording = recorder.finish().await?;
        let name = self.name.clone().unwrap_or_else(|| {
            self.out
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "session".into())
        });
        let metadata = save(recording, &workspace, &session, &name).await?;
        println!(
            "saved {} ({}) to {}",
            metadata.name,
            format_offset(metadata.length),
            self.out.display()
        );
        Ok(())
    }

    async fn initial_frame(&self, workspace: &FsWorkspace) -> Result<Vec<FrameFile<DocumentId>>> {
        let mut files = Vec::with_capacity(self.open.len());
        for relative in &self.open {
            let document = workspace
                .resolve(relative)
                .with_context(|| format!("{relative:?} is not inside {}", self.workspace.display()))?;
            let text = tokio::fs::read_to_string(document.path())
                .await
                .with_context(|| format!("failed to read {}", document.path().display()))?;
            files.push(FrameFile::new(document, text, ViewColumn(1)));
        }
        Ok(files)
    }
}

/// Push input lines into `recorder` until `finish`, end of input or Ctrl-C.
async fn feed<R>(recorder: &mut Recorder, workspace: &FsWorkspace, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read recorder input")?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; finishing recording");
                None
            }
        };
        let Some(line) = line else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        match RecordInput::parse(&line) {
            Ok(RecordInput::Pause) => recorder.pause().await?,
            Ok(RecordInput::Resume) => recorder.resume().await?,
            Ok(RecordInput::Finish) => return Ok(()),
            Ok(RecordInput::Event(event)) => {
                let kind = event.type_name();
                match event.try_map_documents(|path| workspace.resolve(&path)) {
                    Some(event) => {
                        recorder.record(event);
                    }
                    None => warn!(kind, "skipping event for a document outside the workspace"),
                }
            }
            Err(e) => warn!(error = %format!("{e:#}"), "skipping unreadable input line"),
        }
    }
}
