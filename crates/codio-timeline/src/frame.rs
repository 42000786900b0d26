// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Frames: the state of every open document at one instant.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, ShadowDocument};
use crate::text::{Range, Selection, ViewColumn};

/// One document inside a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameFile<D> {
    #[serde(rename = "path")]
    pub document: D,
    pub text: ShadowDocument,
    #[serde(default, alias = "column")]
    pub view_column: ViewColumn,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selections: Vec<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_range: Option<Range>,
    /// One-based index of the last event applied to this file, 0 if none.
    #[serde(rename = "lastActionCount", default)]
    pub last_action: usize,
}

impl<D> FrameFile<D> {
    pub fn new(document: D, text: impl Into<ShadowDocument>, view_column: ViewColumn) -> Self {
        Self {
            document,
            text: text.into(),
            view_column,
            selections: Vec::new(),
            visible_range: None,
            last_action: 0,
        }
    }

    pub fn try_map_document<E>(self, f: impl FnOnce(D) -> Option<E>) -> Option<FrameFile<E>> {
        Some(FrameFile {
            document: f(self.document)?,
            text: self.text,
            view_column: self.view_column,
            selections: self.selections,
            visible_range: self.visible_range,
            last_action: self.last_action,
        })
    }
}

/// Reconstructed editor state at a point in a recording.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    files: Vec<FrameFile<DocumentId>>,
    active: Option<DocumentId>,
    execution_output: Vec<String>,
}

impl Frame {
    /// Frame at time zero: the recording's initial snapshot, with the first
    /// file active.
    pub fn from_initial(files: &[FrameFile<DocumentId>]) -> Self {
        Self {
            files: files.to_vec(),
            active: files.first().map(|file| file.document.clone()),
            execution_output: Vec::new(),
        }
    }

    pub fn files(&self) -> &[FrameFile<DocumentId>] {
        &self.files
    }

    pub fn file(&self, document: &DocumentId) -> Option<&FrameFile<DocumentId>> {
        self.files.iter().find(|file| &file.document == document)
    }

    pub fn file_mut(&mut self, document: &DocumentId) -> Option<&mut FrameFile<DocumentId>> {
        self.files.iter_mut().find(|file| &file.document == document)
    }

    pub fn text(&self, document: &DocumentId) -> Option<&str> {
        self.file(document).map(|file| file.text.text())
    }

    pub fn active(&self) -> Option<&DocumentId> {
        self.active.as_ref()
    }

    pub fn set_active(&mut self, document: Option<DocumentId>) {
        self.active = document;
    }

    /// Terminal output seen so far, oldest first.
    pub fn execution_output(&self) -> &[String] {
        &self.execution_output
    }

    pub fn push_output(&mut self, output: String) {
        self.execution_output.push(output);
    }

    /// Insert `file`, replacing any file with the same identity in place.
    pub fn upsert(&mut self, file: FrameFile<DocumentId>) {
        match self.file_mut(&file.document) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    /// Remove a file. Clears the active editor if it was this file.
    pub fn remove(&mut self, document: &DocumentId) -> Option<FrameFile<DocumentId>> {
        let index = self.files.iter().position(|file| &file.document == document)?;
        if self.active.as_ref() == Some(document) {
            self.active = None;
        }
        Some(self.files.remove(index))
    }
}
