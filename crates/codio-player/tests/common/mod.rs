// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use codio_player::{AudioTrack, PlaybackSource};
use codio_timeline::{
    DocumentId, Event, EventKind, FrameFile, FsWorkspace, Position, TextChange, Timeline,
    ViewColumn,
};

pub const ROOT: &str = "/work/project";

pub fn doc() -> DocumentId {
    DocumentId::new(format!("{ROOT}/a.txt"))
}

pub fn insert_at(time: u64, text: &str) -> Event<String> {
    Event::new(
        time,
        EventKind::DocumentChange {
            document: "a.txt".into(),
            changes: vec![TextChange::insert(Position::new(0, 0), text)],
        },
    )
}

/// Ten seconds: `x` typed at 5s, `y` typed in front of it at 9s.
pub fn typing_timeline() -> Timeline<String> {
    Timeline {
        total_duration_ms: 10_000,
        initial_frame: vec![FrameFile::new("a.txt".to_string(), "", ViewColumn(1))],
        events: vec![insert_at(5000, "x"), insert_at(9000, "y")],
    }
}

#[derive(Clone, Default)]
pub struct FakeAudio {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_to_start: bool,
    pub start_delay: Duration,
}

impl FakeAudio {
    pub fn failing() -> Self {
        Self {
            fail_to_start: true,
            ..Self::default()
        }
    }

    /// A track whose process takes `ms` to come up on every start.
    pub fn slow_to_start(ms: u64) -> Self {
        Self {
            start_delay: Duration::from_millis(ms),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioTrack for FakeAudio {
    async fn play(&mut self, offset_ms: u64) -> anyhow::Result<()> {
        self.record(format!("play {offset_ms}"));
        if self.fail_to_start {
            anyhow::bail!("no audio device");
        }
        tokio::time::sleep(self.start_delay).await;
        Ok(())
    }

    async fn pause(&mut self, offset_ms: u64) -> anyhow::Result<()> {
        self.record(format!("pause {offset_ms}"));
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.record("stop".into());
        Ok(())
    }
}

pub fn source_with(timeline: Timeline<String>, audio: &FakeAudio) -> PlaybackSource {
    PlaybackSource::new(timeline, FsWorkspace::new(ROOT)).with_audio(audio.clone())
}
