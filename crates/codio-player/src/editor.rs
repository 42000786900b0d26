// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Editor state reconstruction.
//!
//! The reconstructor holds the recording's initial frame and its event log
//! bound to live document identities. [`EditorPlayer::materialize`] brings
//! the working [`Frame`] to any offset: forward seeks apply only the events
//! since the last materialization, backward seeks rebuild from the initial
//! frame. Both paths apply the same events in the same order, so the frame
//! for a given offset does not depend on how it was reached.

use codio_timeline::{
    DocumentId, EventKind, Frame, FrameFile, Timeline, ViewColumn, WorkspaceResolver,
};
use tracing::{debug, warn};

use crate::error::ReconstructError;

#[derive(Debug, Clone)]
struct BoundEvent {
    time_ms: u64,
    /// `None` when a referenced document did not resolve.
    kind: Option<EventKind<DocumentId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeStrategy {
    /// Applied the events between the previous offset and the target.
    Incremental,
    /// Reset to the initial frame and replayed up to the target.
    Rebuild,
}

/// What one call to [`EditorPlayer::materialize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Materialized {
    pub strategy: MaterializeStrategy,
    pub applied: usize,
    /// Events skipped because their document was unresolved or not open.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct EditorPlayer {
    initial: Vec<FrameFile<DocumentId>>,
    events: Vec<BoundEvent>,
    frame: Frame,
    offset_ms: u64,
    /// Index of the first event not yet applied to `frame`.
    cursor: usize,
}

impl EditorPlayer {
    /// Bind `timeline` to `workspace`.
    ///
    /// Documents that do not resolve are dropped from the initial frame and
    /// their events become gaps. Loading fails only when the timeline is
    /// out of order or when it references documents and none resolve.
    pub fn load(
        workspace: &dyn WorkspaceResolver,
        timeline: &Timeline<String>,
    ) -> Result<Self, ReconstructError> {
        timeline.validate()?;

        let mut referenced = 0usize;
        let mut resolved = 0usize;
        let mut resolve = |path: String| {
            referenced += 1;
            let id = workspace.resolve(&path);
            match &id {
                Some(_) => resolved += 1,
                None => warn!(path = %path, "document does not resolve in this workspace"),
            }
            id
        };

        let initial: Vec<_> = timeline
            .initial_frame
            .iter()
            .cloned()
            .filter_map(|file| file.try_map_document(&mut resolve))
            .collect();

        let events: Vec<_> = timeline
            .events
            .iter()
            .map(|event| BoundEvent {
                time_ms: event.time,
                kind: event.kind.clone().try_map_documents(&mut resolve),
            })
            .collect();

        if referenced > 0 && resolved == 0 {
            return Err(ReconstructError::NothingResolved { referenced });
        }

        debug!(
            files = initial.len(),
            events = events.len(),
            gaps = events.iter().filter(|e| e.kind.is_none()).count(),
            "editor timeline bound"
        );

        Ok(Self {
            frame: Frame::from_initial(&initial),
            initial,
            events,
            offset_ms: 0,
            cursor: 0,
        })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Offset of the last materialization.
    pub fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    /// Time of the next event after the current offset.
    pub fn next_event_time(&self) -> Option<u64> {
        self.events.get(self.cursor).map(|event| event.time_ms)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Bring the frame to offset `t`: every event with time `<= t` applied,
    /// none after.
    pub fn materialize(&mut self, t: u64) -> Materialized {
        let strategy = if t >= self.offset_ms {
            MaterializeStrategy::Incremental
        } else {
            self.frame = Frame::from_initial(&self.initial);
            self.cursor = 0;
            MaterializeStrategy::Rebuild
        };

        let mut applied = 0;
        let mut skipped = 0;
        while let Some(event) = self.events.get(self.cursor) {
            if event.time_ms > t {
                break;
            }
            let action = self.cursor + 1;
            let done = match &event.kind {
                Some(kind) => apply(&mut self.frame, kind, action),
                None => false,
            };
            if done {
                applied += 1;
            } else {
                skipped += 1;
            }
            self.cursor += 1;
        }
        self.offset_ms = t;

        if skipped > 0 {
            debug!(t, applied, skipped, ?strategy, "materialized with gaps");
        }
        Materialized {
            strategy,
            applied,
            skipped,
        }
    }
}

/// Apply one event. `action` is the event's one-based position in the log.
/// Returns false when the event targets a document the frame lacks.
fn apply(frame: &mut Frame, kind: &EventKind<DocumentId>, action: usize) -> bool {
    match kind {
        EventKind::DocumentChange { document, changes } => {
            let Some(file) = frame.file_mut(document) else {
                return false;
            };
            file.text.apply_all(changes);
            file.last_action = action;
        }
        EventKind::SelectionChange {
            document,
            selections,
        } => {
            let Some(file) = frame.file_mut(document) else {
                return false;
            };
            file.selections = selections.clone();
            file.last_action = action;
        }
        EventKind::VisibleRangeChange {
            document,
            visible_range,
        } => {
            let Some(file) = frame.file_mut(document) else {
                return false;
            };
            file.visible_range = Some(*visible_range);
            file.last_action = action;
        }
        EventKind::ActiveEditorChange {
            document,
            content,
            view_column,
            visible_range,
            selections,
            ..
        } => {
            match frame.file_mut(document) {
                Some(file) => {
                    file.view_column = *view_column;
                    file.selections = selections.clone();
                    if visible_range.is_some() {
                        file.visible_range = *visible_range;
                    }
                    file.last_action = action;
                }
                None => {
                    let mut file = FrameFile::new(document.clone(), content.as_str(), *view_column);
                    file.selections = selections.clone();
                    file.visible_range = *visible_range;
                    file.last_action = action;
                    frame.upsert(file);
                }
            }
            frame.set_active(Some(document.clone()));
        }
        EventKind::Rename {
            old_path,
            new_path,
            content,
        } => {
            let was_active = frame.active() == Some(old_path);
            let mut file = match frame.remove(old_path) {
                Some(file) => file,
                None => match content {
                    Some(content) => {
                        FrameFile::new(old_path.clone(), content.as_str(), ViewColumn::default())
                    }
                    None => return false,
                },
            };
            file.document = new_path.clone();
            file.last_action = action;
            frame.upsert(file);
            if was_active {
                frame.set_active(Some(new_path.clone()));
            }
        }
        EventKind::ExecutionOutput { output } => frame.push_output(output.clone()),
        EventKind::Create { document, content } => {
            let mut file = FrameFile::new(document.clone(), content.as_str(), ViewColumn::default());
            file.last_action = action;
            frame.upsert(file);
        }
        EventKind::Delete { document } | EventKind::Close { document } => {
            if frame.remove(document).is_none() {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use codio_timeline::{Event, FsWorkspace, Position, Range, Selection, TextChange};

    const ROOT: &str = "/work/project";

    fn id(path: &str) -> DocumentId {
        DocumentId::new(format!("{ROOT}/{path}"))
    }

    fn insert(time: u64, path: &str, text: &str) -> Event<String> {
        Event::new(
            time,
            EventKind::DocumentChange {
                document: path.into(),
                changes: vec![TextChange::insert(Position::new(0, 0), text)],
            },
        )
    }

    fn timeline(events: Vec<Event<String>>) -> Timeline<String> {
        Timeline {
            total_duration_ms: 10_000,
            initial_frame: vec![FrameFile::new("a.txt".to_string(), "", ViewColumn(1))],
            events,
        }
    }

    fn load(timeline: &Timeline<String>) -> EditorPlayer {
        EditorPlayer::load(&FsWorkspace::new(ROOT), timeline).unwrap()
    }

    #[codio_test_utils::logged_test]
    fn materializes_exactly_the_events_up_to_t() {
        let mut editor = load(&timeline(vec![insert(5000, "a.txt", "x"), insert(9000, "a.txt", "y")]));

        editor.materialize(4999);
        assert_eq!(editor.frame().text(&id("a.txt")), Some(""));
        editor.materialize(5000);
        assert_eq!(editor.frame().text(&id("a.txt")), Some("x"));
        editor.materialize(9500);
        assert_eq!(editor.frame().text(&id("a.txt")), Some("yx"));
        assert_eq!(editor.frame().file(&id("a.txt")).unwrap().last_action, 2);
        assert_eq!(editor.next_event_time(), None);
    }

    #[codio_test_utils::logged_test]
    fn backward_seek_rebuilds_and_matches_initial_frame() {
        let tl = timeline(vec![insert(5000, "a.txt", "x"), insert(9000, "a.txt", "y")]);
        let mut editor = load(&tl);
        let initial = editor.frame().clone();

        editor.materialize(9000);
        let outcome = editor.materialize(0);
        assert_eq!(outcome.strategy, MaterializeStrategy::Rebuild);
        assert_eq!(editor.frame(), &initial);
        assert_eq!(editor.next_event_time(), Some(5000));
    }

    #[codio_test_utils::logged_test]
    fn incremental_and_rebuild_agree_at_every_offset() {
        let tl = timeline(vec![
            insert(100, "a.txt", "a"),
            Event::new(
                150,
                EventKind::SelectionChange {
                    document: "a.txt".into(),
                    selections: vec![Selection::default()],
                },
            ),
            insert(200, "a.txt", "b"),
            Event::new(
                250,
                EventKind::Create {
                    document: "b.txt".into(),
                    content: "new".into(),
                },
            ),
            insert(300, "b.txt", ">"),
            Event::new(
                300,
                EventKind::ExecutionOutput {
                    output: "built\n".into(),
                },
            ),
            Event::new(400, EventKind::Close { document: "a.txt".into() }),
        ]);

        let mut walker = load(&tl);
        for t in (0..=450).step_by(25) {
            walker.materialize(t);
            let mut fresh = load(&tl);
            fresh.materialize(450);
            fresh.materialize(t);
            assert_eq!(walker.frame(), fresh.frame(), "divergence at {t}ms");
        }
    }

    #[codio_test_utils::logged_test]
    fn active_editor_rename_and_delete() {
        let tl = timeline(vec![
            Event::new(
                10,
                EventKind::ActiveEditorChange {
                    document: "notes.md".into(),
                    content: "# notes".into(),
                    view_column: ViewColumn(2),
                    visible_range: Some(Range::new(Position::new(0, 0), Position::new(5, 0))),
                    selections: Vec::new(),
                    is_initial: false,
                },
            ),
            Event::new(
                20,
                EventKind::Rename {
                    old_path: "notes.md".into(),
                    new_path: "NOTES.md".into(),
                    content: None,
                },
            ),
            Event::new(30, EventKind::Delete { document: "a.txt".into() }),
        ]);
        let mut editor = load(&tl);

        editor.materialize(10);
        assert_eq!(editor.frame().active(), Some(&id("notes.md")));
        assert_eq!(editor.frame().file(&id("notes.md")).unwrap().view_column, ViewColumn(2));

        editor.materialize(20);
        assert_eq!(editor.frame().active(), Some(&id("NOTES.md")));
        assert_eq!(editor.frame().text(&id("NOTES.md")), Some("# notes"));
        assert!(editor.frame().file(&id("notes.md")).is_none());

        editor.materialize(30);
        assert!(editor.frame().file(&id("a.txt")).is_none());
        assert_eq!(editor.frame().files().len(), 1);
    }

    #[codio_test_utils::logged_test]
    fn unresolved_documents_become_gaps() {
        let tl = timeline(vec![
            insert(10, "../outside.txt", "nope"),
            insert(20, "a.txt", "ok"),
        ]);
        let mut editor = load(&tl);
        let outcome = editor.materialize(100);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(editor.frame().text(&id("a.txt")), Some("ok"));
        assert_eq!(editor.frame().file(&id("a.txt")).unwrap().last_action, 2);
    }

    #[codio_test_utils::logged_test]
    fn fails_when_nothing_resolves() {
        let tl = Timeline {
            total_duration_ms: 100,
            initial_frame: vec![FrameFile::new("/abs.txt".to_string(), "", ViewColumn(1))],
            events: vec![insert(10, "../x", "y")],
        };
        let err = EditorPlayer::load(&FsWorkspace::new(ROOT), &tl).unwrap_err();
        assert!(matches!(err, ReconstructError::NothingResolved { referenced: 2 }));
    }

    #[codio_test_utils::logged_test]
    fn timeline_without_documents_loads() {
        let tl: Timeline<String> = Timeline {
            total_duration_ms: 100,
            initial_frame: Vec::new(),
            events: vec![Event::new(
                5,
                EventKind::ExecutionOutput {
                    output: "hi".into(),
                },
            )],
        };
        let mut editor = EditorPlayer::load(&FsWorkspace::new(ROOT), &tl).unwrap();
        editor.materialize(100);
        assert_eq!(editor.frame().execution_output(), ["hi".to_string()]);
    }

    #[codio_test_utils::logged_test]
    fn out_of_order_timeline_is_rejected() {
        let tl = timeline(vec![insert(20, "a.txt", "b"), insert(10, "a.txt", "a")]);
        assert!(matches!(
            EditorPlayer::load(&FsWorkspace::new(ROOT), &tl),
            Err(ReconstructError::Timeline(_))
        ));
    }
}
