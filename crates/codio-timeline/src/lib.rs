// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Data model for recorded coding sessions.
//!
//! A session is a [`Timeline`]: a snapshot of the open documents taken when
//! recording started, followed by a time-ordered log of editor [`Event`]s.
//! Documents are referred to by [`DocumentId`] while live and by
//! workspace-relative path once serialized; both shapes share the same
//! generic types so that conversion is a single mapping pass.

pub mod document;
pub mod error;
pub mod events;
pub mod frame;
pub mod store;
pub mod text;
pub mod timeline;
pub mod workspace;

pub use document::{DocumentId, ShadowDocument};
pub use error::TimelineError;
pub use events::{Event, EventKind};
pub use frame::{Frame, FrameFile};
pub use store::{Archiver, Metadata, SessionDir};
pub use text::{Position, Range, Selection, TextChange, ViewColumn};
pub use timeline::Timeline;
pub use workspace::{FsWorkspace, WorkspaceResolver};
