// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use codio_player::EditorPlayer;
use codio_timeline::{DocumentId, Frame, FrameFile, FsWorkspace, SessionDir, WorkspaceResolver};
use serde_json::json;

use crate::{format_offset, parse_offset};

#[derive(Args)]
pub struct FrameArgs {
    /// Session directory
    pub session: PathBuf,

    /// Offset into the session, in milliseconds or m:ss
    #[arg(long, value_parser = parse_offset, default_value = "0")]
    pub at: u64,

    /// Replay against this directory instead of the session's workspace copy
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl FrameArgs {
    pub async fn run(&self) -> Result<()> {
        let session = SessionDir::new(&self.session);
        let timeline = session.load_timeline().await?;
        let workspace = FsWorkspace::new(
            self.workspace
                .clone()
                .unwrap_or_else(|| session.workspace_dir()),
        );

        let mut editor = EditorPlayer::load(&workspace, &timeline)
            .with_context(|| format!("cannot replay {}", self.session.display()))?;
        let outcome = editor.materialize(self.at);
        tracing::debug!(at_ms = self.at, applied = outcome.applied, skipped = outcome.skipped, "frame materialized");

        if self.json {
            println!("{}", serde_json::to_string_pretty(&frame_json(editor.frame(), &workspace))?);
        } else {
            print!("{}", render(editor.frame(), &workspace, self.at));
        }
        Ok(())
    }
}

fn display_path(workspace: &FsWorkspace, document: &DocumentId) -> String {
    workspace
        .relativize(document)
        .unwrap_or_else(|| document.to_string())
}

fn frame_json(frame: &Frame, workspace: &FsWorkspace) -> serde_json::Value {
    let files: Vec<FrameFile<String>> = frame
        .files()
        .iter()
        .cloned()
        .filter_map(|file| file.try_map_document(|id| Some(display_path(workspace, &id))))
        .collect();
    json!({
        "files": files,
        "active": frame.active().map(|id| display_path(workspace, id)),
        "executionOutput": frame.execution_output(),
    })
}

fn render(frame: &Frame, workspace: &FsWorkspace, at_ms: u64) -> String {
    let mut out = format!("@ {}\n", format_offset(at_ms));
    for file in frame.files() {
        let marker = if frame.active() == Some(&file.document) { " *" } else { "" };
        out.push_str(&format!(
            "== {} (column {}){marker}\n",
            display_path(workspace, &file.document),
            file.view_column.0
        ));
        out.push_str(file.text.text());
        if !file.text.text().ends_with('\n') {
            out.push('\n');
        }
    }
    if !frame.execution_output().is_empty() {
        out.push_str("== output\n");
        for output in frame.execution_output() {
            out.push_str(output);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use codio_timeline::ViewColumn;

    fn frame() -> (Frame, FsWorkspace) {
        let workspace = FsWorkspace::new("/ws");
        let mut frame = Frame::from_initial(&[
            FrameFile::new(DocumentId::new("/ws/a.txt"), "alpha", ViewColumn(1)),
            FrameFile::new(DocumentId::new("/ws/src/b.rs"), "beta\n", ViewColumn(2)),
        ]);
        frame.set_active(Some(DocumentId::new("/ws/src/b.rs")));
        frame.push_output("built\n".into());
        (frame, workspace)
    }

    #[codio_test_utils::logged_test]
    fn renders_documents_with_the_active_marker() {
        let (frame, workspace) = frame();
        assert_eq!(
            render(&frame, &workspace, 61_000),
            "@ 1:01\n== a.txt (column 1)\nalpha\n== src/b.rs (column 2) *\nbeta\n== output\nbuilt\n"
        );
    }

    #[codio_test_utils::logged_test]
    fn json_uses_workspace_relative_paths() {
        let (frame, workspace) = frame();
        let value = frame_json(&frame, &workspace);
        assert_eq!(value["active"], "src/b.rs");
        assert_eq!(value["files"][0]["path"], "a.txt");
        assert_eq!(value["files"][1]["viewColumn"], 2);
        assert_eq!(value["executionOutput"][0], "built\n");
    }
}
