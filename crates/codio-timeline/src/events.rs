// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Editor events captured while recording.
//!
//! Events are generic over the document reference `D`: [`DocumentId`] while
//! the session is live, and a workspace-relative `String` path once written
//! to disk.
//!
//! [`DocumentId`]: crate::DocumentId

use serde::{Deserialize, Serialize};

use crate::text::{Range, Selection, TextChange, ViewColumn};

/// An event stamped with its offset from the start of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<D> {
    /// Milliseconds of active (unpaused) recording time.
    pub time: u64,
    #[serde(flatten)]
    pub kind: EventKind<D>,
}

impl<D> Event<D> {
    pub fn new(time: u64, kind: EventKind<D>) -> Self {
        Self { time, kind }
    }

    /// Re-key every document reference, or `None` if any reference fails to
    /// map.
    pub fn try_map_documents<E>(self, f: impl FnMut(D) -> Option<E>) -> Option<Event<E>> {
        Some(Event {
            time: self.time,
            kind: self.kind.try_map_documents(f)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EventKind<D> {
    /// Text edits, applied in order.
    DocumentChange {
        #[serde(rename = "path")]
        document: D,
        changes: Vec<TextChange>,
    },
    SelectionChange {
        #[serde(rename = "path")]
        document: D,
        selections: Vec<Selection>,
    },
    VisibleRangeChange {
        #[serde(rename = "path")]
        document: D,
        visible_range: Range,
    },
    /// A document became the active editor. Carries enough state to open it
    /// if the frame does not know it yet.
    ActiveEditorChange {
        #[serde(rename = "path")]
        document: D,
        content: String,
        #[serde(default)]
        view_column: ViewColumn,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible_range: Option<Range>,
        #[serde(default)]
        selections: Vec<Selection>,
        #[serde(default)]
        is_initial: bool,
    },
    Rename {
        old_path: D,
        new_path: D,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    /// A chunk of terminal output produced while recording.
    ExecutionOutput { output: String },
    Create {
        #[serde(rename = "path")]
        document: D,
        #[serde(default)]
        content: String,
    },
    Delete {
        #[serde(rename = "path")]
        document: D,
    },
    Close {
        #[serde(rename = "path")]
        document: D,
    },
}

impl<D> EventKind<D> {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::DocumentChange { .. } => "document-change",
            EventKind::SelectionChange { .. } => "selection-change",
            EventKind::VisibleRangeChange { .. } => "visible-range-change",
            EventKind::ActiveEditorChange { .. } => "active-editor-change",
            EventKind::Rename { .. } => "rename",
            EventKind::ExecutionOutput { .. } => "execution-output",
            EventKind::Create { .. } => "create",
            EventKind::Delete { .. } => "delete",
            EventKind::Close { .. } => "close",
        }
    }

    /// Every document this event refers to.
    pub fn documents(&self) -> Vec<&D> {
        match self {
            EventKind::DocumentChange { document, .. }
            | EventKind::SelectionChange { document, .. }
            | EventKind::VisibleRangeChange { document, .. }
            | EventKind::ActiveEditorChange { document, .. }
            | EventKind::Create { document, .. }
            | EventKind::Delete { document }
            | EventKind::Close { document } => vec![document],
            EventKind::Rename {
                old_path, new_path, ..
            } => vec![old_path, new_path],
            EventKind::ExecutionOutput { .. } => Vec::new(),
        }
    }

    pub fn try_map_documents<E>(self, mut f: impl FnMut(D) -> Option<E>) -> Option<EventKind<E>> {
        Some(match self {
            EventKind::DocumentChange { document, changes } => EventKind::DocumentChange {
                document: f(document)?,
                changes,
            },
            EventKind::SelectionChange {
                document,
                selections,
            } => EventKind::SelectionChange {
                document: f(document)?,
                selections,
            },
            EventKind::VisibleRangeChange {
                document,
                visible_range,
            } => EventKind::VisibleRangeChange {
                document: f(document)?,
                visible_range,
            },
            EventKind::ActiveEditorChange {
                document,
                content,
                view_column,
                visible_range,
                selections,
                is_initial,
            } => EventKind::ActiveEditorChange {
                document: f(document)?,
                content,
                view_column,
                visible_range,
                selections,
                is_initial,
            },
            EventKind::Rename {
                old_path,
                new_path,
                content,
            } => EventKind::Rename {
                old_path: f(old_path)?,
                new_path: f(new_path)?,
                content,
            },
            EventKind::ExecutionOutput { output } => EventKind::ExecutionOutput { output },
            EventKind::Create { document, content } => EventKind::Create {
                document: f(document)?,
                content,
            },
            EventKind::Delete { document } => EventKind::Delete {
                document: f(document)?,
            },
            EventKind::Close { document } => EventKind::Close {
                document: f(document)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Position;
    use serde_json::json;

    #[codio_test_utils::logged_test]
    fn wire_shape_is_flat_and_tagged() {
        let event = Event::new(
            5000,
            EventKind::DocumentChange {
                document: "src/main.rs".to_string(),
                changes: vec![TextChange::insert(Position::new(0, 0), "x")],
            },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "time": 5000,
                "type": "document-change",
                "path": "src/main.rs",
                "changes": [{
                    "range": {
                        "start": {"line": 0, "character": 0},
                        "end": {"line": 0, "character": 0}
                    },
                    "text": "x"
                }]
            })
        );
    }

    #[codio_test_utils::logged_test]
    fn active_editor_fields_are_camel_case_with_defaults() {
        let parsed: Event<String> = serde_json::from_value(json!({
            "time": 10,
            "type": "active-editor-change",
            "path": "README.md",
            "content": "# hi",
            "viewColumn": 2,
            "isInitial": true
        }))
        .unwrap();
        match parsed.kind {
            EventKind::ActiveEditorChange {
                view_column,
                selections,
                is_initial,
                visible_range,
                ..
            } => {
                assert_eq!(view_column, ViewColumn(2));
                assert!(selections.is_empty());
                assert!(is_initial);
                assert_eq!(visible_range, None);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[codio_test_utils::logged_test]
    fn mapping_fails_when_any_document_is_unmapped() {
        let rename: EventKind<&str> = EventKind::Rename {
            old_path: "a.txt",
            new_path: "../outside.txt",
            content: None,
        };
        let mapped = rename.try_map_documents(|path| (!path.starts_with("..")).then_some(path));
        assert!(mapped.is_none());

        let output: EventKind<&str> = EventKind::ExecutionOutput {
            output: "ok\n".into(),
        };
        assert!(output.documents().is_empty());
        assert!(output.try_map_documents(|_| None::<String>).is_some());
    }
}
