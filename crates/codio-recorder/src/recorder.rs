// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Live capture of editor events.
//!
//! Event times are active recording time: the milliseconds banked from
//! earlier segments plus the time since the current segment started.
//!
//! ```text
//! Idle --start--> Recording <--pause/resume--> Paused
//!                     \                          /
//!                      `------> Finished <------'
//! ```

use std::path::PathBuf;

use codio_timeline::{DocumentId, Event, EventKind, FrameFile, Timeline};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::capture::AudioCapture;
use crate::error::RecorderError;

/// Where observed editor changes are pushed.
pub trait EventSink {
    fn on_event(&mut self, event: EventKind<DocumentId>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
    Finished,
}

/// A finished recording.
#[derive(Debug)]
pub struct Recording {
    pub timeline: Timeline<DocumentId>,
    /// The narration file, when capture ran to completion.
    pub audio: Option<PathBuf>,
}

pub struct Recorder {
    state: RecorderState,
    /// Start of the current active segment.
    anchor: Option<Instant>,
    accumulated_ms: u64,
    last_time_ms: u64,
    initial_frame: Vec<FrameFile<DocumentId>>,
    events: Vec<Event<DocumentId>>,
    audio: Option<AudioCapture>,
    audio_failed: bool,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            anchor: None,
            accumulated_ms: 0,
            last_time_ms: 0,
            initial_frame: Vec::new(),
            events: Vec::new(),
            audio: None,
            audio_failed: false,
        }
    }

    pub fn with_audio(mut self, audio: AudioCapture) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn events(&self) -> &[Event<DocumentId>] {
        &self.events
    }

    /// Active recording time so far.
    pub fn elapsed_ms(&self) -> u64 {
        let segment = self
            .anchor
            .map(|anchor| Instant::now().saturating_duration_since(anchor).as_millis() as u64)
            .unwrap_or(0);
        self.accumulated_ms + segment
    }

    /// Begin recording with a snapshot of the documents open right now.
    ///
    /// Narration that fails to start is logged and recording continues
    /// without it.
    pub async fn start(
        &mut self,
        initial_frame: Vec<FrameFile<DocumentId>>,
    ) -> Result<(), RecorderError> {
        match self.state {
            RecorderState::Idle => {}
            RecorderState::Finished => return Err(RecorderError::AlreadyFinished),
            RecorderState::Recording | RecorderState::Paused => {
                return Err(RecorderError::AlreadyStarted)
            }
        }

        // The clock starts once capture is running, so the start delay is
        // already behind the anchor.
        if let Some(audio) = self.audio.as_mut() {
            match audio.start().await {
                Ok(start_delay_ms) => debug!(start_delay_ms, "narration capture started"),
                Err(e) => {
                    warn!(error = %e, "narration capture failed to start; recording without it");
                    self.audio_failed = true;
                }
            }
        }

        info!(documents = initial_frame.len(), "recording started");
        self.initial_frame = initial_frame;
        self.anchor = Some(Instant::now());
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Append `event` at the current recording time.
    ///
    /// Returns the stored time, or `None` when the event was dropped
    /// because the recorder is not recording.
    pub fn record(&mut self, event: EventKind<DocumentId>) -> Option<u64> {
        match self.state {
            RecorderState::Recording => {}
            RecorderState::Paused => {
                debug!(kind = event.type_name(), "dropping event while paused");
                return None;
            }
            RecorderState::Idle | RecorderState::Finished => {
                warn!(state = ?self.state, kind = event.type_name(), "dropping event: not recording");
                return None;
            }
        }
        // Never behind an earlier event, even if the clock is coarse.
        let time = self.elapsed_ms().max(self.last_time_ms);
        trace!(time_ms = time, kind = event.type_name(), "recorded event");
        self.last_time_ms = time;
        self.events.push(Event::new(time, event));
        Some(time)
    }

    /// Bank the current segment and stop accepting events.
    pub async fn pause(&mut self) -> Result<(), RecorderError> {
        match self.state {
            RecorderState::Recording => {}
            RecorderState::Paused => return Ok(()),
            RecorderState::Idle => return Err(RecorderError::NotRecording),
            RecorderState::Finished => return Err(RecorderError::AlreadyFinished),
        }
        self.bank();
        self.state = RecorderState::Paused;
        if let Some(audio) = self.live_audio() {
            if let Err(e) = audio.pause().await {
                warn!(error = %e, "failed to pause narration capture");
            }
        }
        info!(at_ms = self.accumulated_ms, "recording paused");
        Ok(())
    }

    /// Start a new active segment.
    pub async fn resume(&mut self) -> Result<(), RecorderError> {
        match self.state {
            RecorderState::Paused => {}
            RecorderState::Recording => return Ok(()),
            RecorderState::Idle => return Err(RecorderError::NotRecording),
            RecorderState::Finished => return Err(RecorderError::AlreadyFinished),
        }
        if let Some(audio) = self.live_audio() {
            if let Err(e) = audio.resume().await {
                warn!(error = %e, "failed to resume narration capture");
            }
        }
        self.anchor = Some(Instant::now());
        self.state = RecorderState::Recording;
        info!(at_ms = self.accumulated_ms, "recording resumed");
        Ok(())
    }

    /// Close the recording and hand out its timeline.
    ///
    /// The total duration includes the running segment when still recording.
    pub async fn finish(&mut self) -> Result<Recording, RecorderError> {
        match self.state {
            RecorderState::Recording | RecorderState::Paused => {}
            RecorderState::Idle => return Err(RecorderError::NotRecording),
            RecorderState::Finished => return Err(RecorderError::AlreadyFinished),
        }
        self.bank();
        self.state = RecorderState::Finished;

        let audio = match self.live_audio() {
            Some(audio) => match audio.stop().await {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "narration capture did not finish cleanly; dropping it");
                    None
                }
            },
            None => None,
        };

        let timeline = Timeline {
            total_duration_ms: self.accumulated_ms.max(self.last_time_ms),
            initial_frame: std::mem::take(&mut self.initial_frame),
            events: std::mem::take(&mut self.events),
        };
        info!(
            total_ms = timeline.total_duration_ms,
            events = timeline.events.len(),
            audio = audio.is_some(),
            "recording finished"
        );
        Ok(Recording { timeline, audio })
    }

    fn bank(&mut self) {
        self.accumulated_ms = self.elapsed_ms();
        self.anchor = None;
    }

    fn live_audio(&mut self) -> Option<&mut AudioCapture> {
        if self.audio_failed {
            return None;
        }
        self.audio.as_mut()
    }
}

impl EventSink for Recorder {
    fn on_event(&mut self, event: EventKind<DocumentId>) {
        self.record(event);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use codio_timeline::{Position, TextChange, ViewColumn};
    use tokio::time::advance;

    use super::*;

    fn doc() -> DocumentId {
        DocumentId::new("/work/a.txt")
    }

    fn typed(text: &str) -> EventKind<DocumentId> {
        EventKind::DocumentChange {
            document: doc(),
            changes: vec![TextChange::insert(Position::new(0, 0), text)],
        }
    }

    #[codio_test_utils::logged_tokio_test(start_paused = true)]
    async fn paused_time_is_excluded() {
        let mut recorder = Recorder::new();
        recorder
            .start(vec![FrameFile::new(doc(), "", ViewColumn(1))])
            .await
            .unwrap();

        advance(Duration::from_millis(1200)).await;
        assert_eq!(recorder.record(typed("a")), Some(1200));

        recorder.pause().await.unwrap();
        advance(Duration::from_secs(30)).await;
        assert_eq!(recorder.record(typed("lost")), None);
        assert_eq!(recorder.elapsed_ms(), 1200);

        recorder.resume().await.unwrap();
        advance(Duration::from_millis(300)).await;
        assert_eq!(recorder.record(typed("b")), Some(1500));

        advance(Duration::from_millis(500)).await;
        let recording = recorder.finish().await.unwrap();
        let times: Vec<_> = recording.timeline.events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1200, 1500]);
        assert_eq!(recording.timeline.total_duration_ms, 2000);
        assert_eq!(recording.timeline.initial_frame.len(), 1);
        assert!(recording.audio.is_none());
        recording.timeline.validate().unwrap();
    }

    #[codio_test_utils::logged_tokio_test(start_paused = true)]
    async fn finish_while_paused_uses_banked_time() {
        let mut recorder = Recorder::new();
        recorder.start(Vec::new()).await.unwrap();
        advance(Duration::from_millis(800)).await;
        recorder.pause().await.unwrap();
        advance(Duration::from_secs(10)).await;

        let recording = recorder.finish().await.unwrap();
        assert_eq!(recording.timeline.total_duration_ms, 800);
        assert_eq!(recorder.state(), RecorderState::Finished);
    }

    #[codio_test_utils::logged_tokio_test(start_paused = true)]
    async fn transitions_are_checked() {
        let mut recorder = Recorder::new();
        assert!(matches!(recorder.pause().await, Err(RecorderError::NotRecording)));
        assert!(matches!(recorder.finish().await, Err(RecorderError::NotRecording)));
        assert_eq!(recorder.record(typed("early")), None);

        recorder.start(Vec::new()).await.unwrap();
        assert!(matches!(
            recorder.start(Vec::new()).await,
            Err(RecorderError::AlreadyStarted)
        ));
        recorder.resume().await.unwrap();
        recorder.pause().await.unwrap();
        recorder.pause().await.unwrap();
        assert_eq!(recorder.state(), RecorderState::Paused);

        recorder.finish().await.unwrap();
        assert!(matches!(recorder.finish().await, Err(RecorderError::AlreadyFinished)));
        assert!(matches!(recorder.resume().await, Err(RecorderError::AlreadyFinished)));
        assert_eq!(recorder.record(typed("late")), None);
    }

    #[codio_test_utils::logged_tokio_test(start_paused = true)]
    async fn events_through_the_sink_keep_their_order() {
        let mut recorder = Recorder::new();
        recorder.start(Vec::new()).await.unwrap();
        let sink: &mut dyn EventSink = &mut recorder;
        sink.on_event(typed("a"));
        sink.on_event(EventKind::ExecutionOutput {
            output: "ok\n".into(),
        });
        advance(Duration::from_millis(5)).await;
        sink.on_event(typed("b"));

        let times: Vec<_> = recorder.events().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0, 0, 5]);
    }
}
