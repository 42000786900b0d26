// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document::DocumentId;
use crate::error::TimelineError;
use crate::events::Event;
use crate::frame::FrameFile;
use crate::workspace::WorkspaceResolver;

/// A complete recording: initial snapshot plus the ordered event log.
///
/// Serialized timelines use `Timeline<String>` with workspace-relative
/// paths. Live recordings produce `Timeline<DocumentId>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline<D = String> {
    #[serde(alias = "codioLength")]
    pub total_duration_ms: u64,
    #[serde(default)]
    pub initial_frame: Vec<FrameFile<D>>,
    #[serde(default)]
    pub events: Vec<Event<D>>,
}

impl<D> Timeline<D> {
    /// Event times must be non-decreasing and within the recording.
    pub fn validate(&self) -> Result<(), TimelineError> {
        let mut previous_ms = 0;
        for (index, event) in self.events.iter().enumerate() {
            if event.time < previous_ms {
                return Err(TimelineError::OutOfOrder {
                    index,
                    time_ms: event.time,
                    previous_ms,
                });
            }
            if event.time > self.total_duration_ms {
                return Err(TimelineError::PastEnd {
                    index,
                    time_ms: event.time,
                    total_ms: self.total_duration_ms,
                });
            }
            previous_ms = event.time;
        }
        Ok(())
    }

    /// Every document referenced by the snapshot or the event log.
    pub fn documents(&self) -> impl Iterator<Item = &D> {
        self.initial_frame
            .iter()
            .map(|file| &file.document)
            .chain(self.events.iter().flat_map(|event| event.kind.documents()))
    }
}

impl Timeline<String> {
    /// Parse and validate a serialized timeline.
    pub fn from_json(json: &str) -> Result<Self, TimelineError> {
        let timeline: Self = serde_json::from_str(json)?;
        timeline.validate()?;
        Ok(timeline)
    }

    pub fn to_json_pretty(&self) -> Result<String, TimelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Timeline<DocumentId> {
    /// Convert live identities to workspace-relative paths.
    ///
    /// Documents outside the workspace cannot be replayed elsewhere, so
    /// snapshot files and events that touch them are dropped with a warning.
    pub fn relativize(self, workspace: &dyn WorkspaceResolver) -> Timeline<String> {
        let initial_frame = self
            .initial_frame
            .into_iter()
            .filter_map(|file| {
                let document = file.document.clone();
                let mapped = file.try_map_document(|id| workspace.relativize(&id));
                if mapped.is_none() {
                    warn!(%document, "dropping snapshot of document outside the workspace");
                }
                mapped
            })
            .collect();

        let events = self
            .events
            .into_iter()
            .filter_map(|event| {
                let time = event.time;
                let kind = event.kind.type_name();
                let mapped = event.try_map_documents(|id| workspace.relativize(&id));
                if mapped.is_none() {
                    warn!(time_ms = time, kind, "dropping event for document outside the workspace");
                }
                mapped
            })
            .collect();

        Timeline {
            total_duration_ms: self.total_duration_ms,
            initial_frame,
            events,
        }
    }
}
