// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The playback state machine.
//!
//! ```text
//! Idle --load--> Loaded --play--> Playing <--pause/resume--> Paused
//!                   \                 \                        /
//!                    `------stop------>`-------> Closed <-----'
//! ```
//!
//! Every transport operation first reconciles the clock, then moves the
//! editor, captions, narration and progress timer together. Operations that
//! make no sense in the current state log and do nothing.

use std::time::Duration;

use codio_timeline::Frame;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::clock::PlaybackClock;
use crate::editor::EditorPlayer;
use crate::error::{PlayerError, ReconstructError};
use crate::session::TransportCommand;
use crate::source::PlaybackSource;
use crate::timer::{Progress, ProgressTimer, TimerEvent};
use crate::tracks::{AudioTrack, SubtitleTrack};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Loaded,
    Playing,
    Paused,
    Closed,
}

impl PlayerState {
    /// A session is loaded and not yet closed.
    pub fn has_session(self) -> bool {
        matches!(
            self,
            PlayerState::Loaded | PlayerState::Playing | PlayerState::Paused
        )
    }
}

/// Flags a host UI keys its controls on. Derived from [`PlayerState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerContext {
    pub is_playing: bool,
    pub in_session: bool,
}

impl From<PlayerState> for PlayerContext {
    fn from(state: PlayerState) -> Self {
        Self {
            is_playing: state == PlayerState::Playing,
            in_session: matches!(state, PlayerState::Playing | PlayerState::Paused),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    /// Progress tick interval.
    pub tick: Duration,
    /// Default step for rewind and forward.
    pub skip_secs: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            skip_secs: 10,
        }
    }
}

pub struct Player {
    settings: PlayerSettings,
    state: watch::Sender<PlayerState>,
    clock: PlaybackClock,
    total_ms: u64,
    editor: Option<EditorPlayer>,
    audio: Option<Box<dyn AudioTrack>>,
    subtitles: Option<Box<dyn SubtitleTrack>>,
    captions: Option<watch::Receiver<Option<String>>>,
    timer: Option<ProgressTimer>,
    timer_events: mpsc::UnboundedSender<TimerEvent>,
    /// Set when playback starts, cleared by the first interaction it sees.
    interaction_armed: bool,
    progress: watch::Sender<Progress>,
    completion: watch::Sender<bool>,
}

impl Player {
    /// Create an idle player and the receiver its progress timer reports to.
    ///
    /// Timer events must be passed back through [`Player::on_timer_event`];
    /// [`crate::session::spawn`] does this.
    pub fn new(settings: PlayerSettings) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (timer_events, timer_rx) = mpsc::unbounded_channel();
        let player = Self {
            settings,
            state: watch::channel(PlayerState::Idle).0,
            clock: PlaybackClock::new(),
            total_ms: 0,
            editor: None,
            audio: None,
            subtitles: None,
            captions: None,
            timer: None,
            timer_events,
            interaction_armed: false,
            progress: watch::channel(Progress::default()).0,
            completion: watch::channel(false).0,
        };
        (player, timer_rx)
    }

    pub fn state(&self) -> PlayerState {
        *self.state.borrow()
    }

    pub fn context(&self) -> PlayerContext {
        self.state().into()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.state.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Flips to `true` once when the loaded session closes.
    pub fn completion(&self) -> watch::Receiver<bool> {
        self.completion.subscribe()
    }

    pub fn captions(&self) -> Option<watch::Receiver<Option<String>>> {
        self.captions.clone()
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Position the clock was last reconciled to.
    pub fn relative_active_ms(&self) -> u64 {
        self.clock.relative_active_ms()
    }

    /// Live playback position.
    pub fn current_offset(&self) -> u64 {
        self.clock.current(Instant::now()).min(self.total_ms)
    }

    /// Editor state, unless the session has no resolvable documents.
    pub fn frame(&self) -> Option<&Frame> {
        self.editor.as_ref().map(EditorPlayer::frame)
    }

    pub fn editor(&self) -> Option<&EditorPlayer> {
        self.editor.as_ref()
    }

    /// Load a session, closing any session already loaded.
    ///
    /// A corrupt timeline fails the load and leaves the player untouched.
    /// When no recorded document resolves, the editor track is dropped and
    /// the remaining tracks still play.
    pub async fn load(&mut self, source: PlaybackSource) -> Result<(), PlayerError> {
        let PlaybackSource {
            timeline,
            workspace,
            audio,
            subtitles,
            captions,
        } = source;

        let editor = match EditorPlayer::load(&*workspace, &timeline) {
            Ok(editor) => Some(editor),
            Err(ReconstructError::NothingResolved { referenced }) => {
                warn!(
                    referenced,
                    "no recorded document resolves; playing without the editor track"
                );
                None
            }
            Err(e) => {
                error!(error = %e, "failed to load session");
                return Err(e.into());
            }
        };

        if self.state().has_session() {
            self.stop().await;
        }

        self.total_ms = timeline.total_duration_ms;
        self.clock = PlaybackClock::new();
        self.editor = editor;
        self.audio = audio;
        self.subtitles = subtitles;
        self.captions = captions;
        self.timer = Some(ProgressTimer::new(
            self.total_ms,
            self.settings.tick,
            self.timer_events.clone(),
        ));
        self.interaction_armed = false;
        self.completion.send_replace(false);
        self.publish_progress(0);
        self.set_state(PlayerState::Loaded);

        info!(
            total_ms = self.total_ms,
            events = timeline.events.len(),
            audio = self.audio.is_some(),
            subtitles = self.subtitles.is_some(),
            "session loaded"
        );
        Ok(())
    }

    /// Start playing from `from_ms`, clamped to the recording.
    ///
    /// Editor, captions, narration and timer all start from the same anchor
    /// instant, taken once narration has started. Narration failures are
    /// logged and playback continues.
    pub async fn play(&mut self, from_ms: u64) {
        if !self.state().has_session() {
            warn!(state = ?self.state(), "play ignored: no session loaded");
            return;
        }
        if self.state() == PlayerState::Playing {
            let at = self.current_offset();
            self.halt_tracks(at).await;
        }

        let target = from_ms.min(self.total_ms);
        self.materialize(target);

        // Narration is audible only once its process is up, so the shared
        // anchor is taken after the start delay has elapsed.
        if let Some(audio) = self.audio.as_mut() {
            if let Err(e) = audio.play(target).await {
                warn!(error = %e, offset_ms = target, "narration failed to start; continuing without it");
            }
        }
        let anchor = Instant::now();
        self.clock.start(target, anchor);
        if let Some(subtitles) = self.subtitles.as_mut() {
            subtitles.play(target, anchor);
        }
        if let Some(timer) = self.timer.as_mut() {
            timer.run_anchored(target, anchor);
        }

        self.interaction_armed = true;
        self.publish_progress(target);
        self.set_state(PlayerState::Playing);
        info!(from_ms = target, "playing");
    }

    /// Pause at the current offset. Does nothing unless playing.
    pub async fn pause(&mut self) {
        if self.state() != PlayerState::Playing {
            debug!(state = ?self.state(), "pause ignored");
            return;
        }
        let now = Instant::now();
        let at = self.clock.freeze(now).min(self.total_ms);
        self.clock.set(at, now);
        self.halt_tracks(at).await;
        self.materialize(at);
        self.publish_progress(at);
        self.set_state(PlayerState::Paused);
        info!(at_ms = at, "paused");
    }

    /// Continue from the paused offset. Does nothing if already playing.
    pub async fn resume(&mut self) {
        match self.state() {
            PlayerState::Playing => info!("already playing"),
            PlayerState::Loaded | PlayerState::Paused => {
                let from = self.clock.relative_active_ms();
                self.play(from).await;
            }
            PlayerState::Idle | PlayerState::Closed => {
                warn!(state = ?self.state(), "resume ignored: no session loaded");
            }
        }
    }

    pub async fn pause_or_resume(&mut self) {
        if self.state() == PlayerState::Playing {
            self.pause().await;
        } else {
            self.resume().await;
        }
    }

    /// Step back `secs`, stopping at the start.
    pub async fn rewind(&mut self, secs: u64) {
        if !self.state().has_session() {
            warn!(state = ?self.state(), "rewind ignored: no session loaded");
            return;
        }
        let target = self.current_offset().saturating_sub(secs.saturating_mul(1000));
        debug!(secs, target_ms = target, "rewind");
        self.seek_to(target).await;
    }

    /// Step forward `secs`, stopping at the end.
    pub async fn forward(&mut self, secs: u64) {
        if !self.state().has_session() {
            warn!(state = ?self.state(), "forward ignored: no session loaded");
            return;
        }
        let target = self
            .current_offset()
            .saturating_add(secs.saturating_mul(1000))
            .min(self.total_ms);
        debug!(secs, target_ms = target, "forward");
        self.seek_to(target).await;
    }

    /// Move to `ms` keeping the play/pause state.
    pub async fn seek_to(&mut self, ms: u64) {
        if !self.state().has_session() {
            warn!(state = ?self.state(), "seek ignored: no session loaded");
            return;
        }
        let target = ms.min(self.total_ms);
        if self.state() == PlayerState::Playing {
            self.play(target).await;
        } else {
            self.clock.set(target, Instant::now());
            self.materialize(target);
            self.publish_progress(target);
            debug!(target_ms = target, "seeked while stopped");
        }
    }

    /// Move to `ms` and play from there.
    pub async fn goto(&mut self, ms: u64) {
        self.play(ms).await;
    }

    /// Close the session: pause, release every track and signal completion.
    pub async fn stop(&mut self) {
        if !self.state().has_session() {
            debug!(state = ?self.state(), "stop ignored");
            return;
        }
        if self.state() == PlayerState::Playing {
            self.pause().await;
        }

        self.interaction_armed = false;
        if let Some(timer) = self.timer.as_mut() {
            timer.stop();
        }
        if let Some(subtitles) = self.subtitles.as_mut() {
            subtitles.stop();
        }
        if let Some(audio) = self.audio.as_mut() {
            if let Err(e) = audio.stop().await {
                warn!(error = %e, "failed to stop narration");
            }
        }

        self.set_state(PlayerState::Closed);
        self.completion.send_replace(true);
        info!(at_ms = self.clock.relative_active_ms(), "session closed");
    }

    /// The user touched the editor. The first interaction after playback
    /// starts pauses it; later ones are ignored until the next play.
    pub async fn external_interaction(&mut self) -> bool {
        if self.state() != PlayerState::Playing || !self.interaction_armed {
            return false;
        }
        self.interaction_armed = false;
        info!("pausing on user interaction");
        self.pause().await;
        true
    }

    /// Handle an event from the progress timer.
    pub async fn on_timer_event(&mut self, event: TimerEvent) {
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        if !timer.accept(&event) {
            trace!(run = event.run(), "stale timer event");
            return;
        }
        match event {
            TimerEvent::Tick { progress, .. } => {
                self.progress.send_replace(progress);
                self.advance_editor();
            }
            TimerEvent::Finished { .. } => {
                info!(total_ms = self.total_ms, "reached the end of the recording");
                self.stop().await;
            }
        }
    }

    /// Apply editor events that are due at the current offset.
    pub fn advance_editor(&mut self) {
        if self.state() == PlayerState::Playing {
            let now = self.current_offset();
            self.materialize(now);
        }
    }

    /// When the next editor event falls due, while playing.
    pub fn next_editor_deadline(&self) -> Option<Instant> {
        if self.state() != PlayerState::Playing {
            return None;
        }
        let anchor = self.clock.anchor()?;
        let next = self.editor.as_ref()?.next_event_time()?;
        let from = self.clock.relative_active_ms();
        Some(anchor + Duration::from_millis(next.saturating_sub(from)))
    }

    /// Dispatch a transport command.
    pub async fn apply(&mut self, command: TransportCommand) {
        debug!(?command, "transport command");
        let skip_secs = self.settings.skip_secs;
        match command {
            TransportCommand::Play { from_ms } => self.play(from_ms).await,
            TransportCommand::Pause => self.pause().await,
            TransportCommand::Resume => self.resume().await,
            TransportCommand::PauseOrResume => self.pause_or_resume().await,
            TransportCommand::Rewind { secs } => {
                self.rewind(secs.unwrap_or(skip_secs)).await;
            }
            TransportCommand::Forward { secs } => {
                self.forward(secs.unwrap_or(skip_secs)).await;
            }
            TransportCommand::Seek { ms } => self.seek_to(ms).await,
            TransportCommand::Goto { ms } => self.goto(ms).await,
            TransportCommand::Interaction => {
                self.external_interaction().await;
            }
            TransportCommand::Stop => self.stop().await,
        }
    }

    async fn halt_tracks(&mut self, at_ms: u64) {
        self.interaction_armed = false;
        if let Some(timer) = self.timer.as_mut() {
            timer.stop();
        }
        if let Some(subtitles) = self.subtitles.as_mut() {
            subtitles.pause();
        }
        if let Some(audio) = self.audio.as_mut() {
            if let Err(e) = audio.pause(at_ms).await {
                warn!(error = %e, at_ms, "failed to pause narration");
            }
        }
    }

    fn materialize(&mut self, at_ms: u64) {
        if let Some(editor) = self.editor.as_mut() {
            let outcome = editor.materialize(at_ms);
            trace!(at_ms, applied = outcome.applied, strategy = ?outcome.strategy, "editor materialized");
        }
    }

    fn publish_progress(&self, current_ms: u64) {
        self.progress.send_replace(Progress {
            current_ms,
            total_ms: self.total_ms,
        });
    }

    fn set_state(&self, state: PlayerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(?previous, ?state, "player state changed");
        }
    }
}
