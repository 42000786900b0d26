// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! A player running as its own task.
//!
//! Transport commands, timer events and editor deadlines are handled one at
//! a time by a single loop, so no two operations ever interleave.

use std::str::FromStr;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::error::PlayerError;
use crate::player::{Player, PlayerContext, PlayerState};
use crate::timer::{Progress, TimerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play { from_ms: u64 },
    Pause,
    Resume,
    PauseOrResume,
    /// `None` uses the configured step.
    Rewind { secs: Option<u64> },
    Forward { secs: Option<u64> },
    Seek { ms: u64 },
    Goto { ms: u64 },
    /// The user touched the editor.
    Interaction,
    Stop,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized transport command {0:?}")]
pub struct ParseCommandError(String);

impl FromStr for TransportCommand {
    type Err = ParseCommandError;

    /// Parse commands such as `pause`, `rewind 5` or `goto 1:30`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseCommandError(line.trim().to_string());
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(invalid)?.to_ascii_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return Err(invalid());
        }

        let offset = |arg: Option<&str>| arg.and_then(parse_offset_ms).ok_or_else(invalid);
        let secs = |arg: Option<&str>| match arg {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| invalid()),
        };

        let command = match verb.as_str() {
            "play" => TransportCommand::Play {
                from_ms: match arg {
                    None => 0,
                    some => offset(some)?,
                },
            },
            "pause" => TransportCommand::Pause,
            "resume" => TransportCommand::Resume,
            "toggle" | "pause-or-resume" => TransportCommand::PauseOrResume,
            "rewind" | "back" => TransportCommand::Rewind { secs: secs(arg)? },
            "forward" | "fwd" => TransportCommand::Forward { secs: secs(arg)? },
            "seek" => TransportCommand::Seek { ms: offset(arg)? },
            "goto" => TransportCommand::Goto { ms: offset(arg)? },
            "interact" => TransportCommand::Interaction,
            "stop" | "quit" => TransportCommand::Stop,
            _ => return Err(invalid()),
        };
        if arg.is_some()
            && matches!(
                command,
                TransportCommand::Pause
                    | TransportCommand::Resume
                    | TransportCommand::PauseOrResume
                    | TransportCommand::Interaction
                    | TransportCommand::Stop
            )
        {
            return Err(invalid());
        }
        Ok(command)
    }
}

/// Milliseconds from `1500`, `1:30` (m:ss) or `1:02:03` (h:mm:ss).
pub fn parse_offset_ms(value: &str) -> Option<u64> {
    if !value.contains(':') {
        return value.parse().ok();
    }
    let mut total_secs = 0u64;
    for part in value.split(':') {
        total_secs = total_secs.checked_mul(60)?.checked_add(part.parse().ok()?)?;
    }
    total_secs.checked_mul(1000)
}

/// Handle to a running player task.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<TransportCommand>,
    state: watch::Receiver<PlayerState>,
    progress: watch::Receiver<Progress>,
    completion: watch::Receiver<bool>,
    captions: Option<watch::Receiver<Option<String>>>,
}

impl PlayerHandle {
    pub fn send(&self, command: TransportCommand) -> Result<(), PlayerError> {
        self.commands
            .send(command)
            .map_err(|_| PlayerError::SessionClosed)
    }

    pub fn state(&self) -> PlayerState {
        *self.state.borrow()
    }

    pub fn context(&self) -> PlayerContext {
        self.state().into()
    }

    pub fn state_updates(&self) -> watch::Receiver<PlayerState> {
        self.state.clone()
    }

    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.clone()
    }

    pub fn captions(&self) -> Option<watch::Receiver<Option<String>>> {
        self.captions.clone()
    }

    /// Wait for the session to close.
    pub async fn finished(&self) {
        let mut completion = self.completion.clone();
        // A dropped sender means the player is gone, which also ends the wait.
        let _ = completion.wait_for(|done| *done).await;
    }
}

/// Run `player` on its own task.
///
/// The task ends once the session closes or every handle is dropped, and
/// hands the player back through the join handle.
pub fn spawn(
    player: Player,
    timer_events: mpsc::UnboundedReceiver<TimerEvent>,
) -> (PlayerHandle, JoinHandle<Player>) {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let handle = PlayerHandle {
        commands,
        state: player.subscribe_state(),
        progress: player.subscribe_progress(),
        completion: player.completion(),
        captions: player.captions(),
    };
    let task = tokio::spawn(run(player, command_rx, timer_events));
    (handle, task)
}

async fn run(
    mut player: Player,
    mut commands: mpsc::UnboundedReceiver<TransportCommand>,
    mut timer_events: mpsc::UnboundedReceiver<TimerEvent>,
) -> Player {
    loop {
        let deadline = player.next_editor_deadline();
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => player.apply(command).await,
                None => {
                    debug!("all player handles dropped");
                    player.stop().await;
                    break;
                }
            },
            Some(event) = timer_events.recv() => player.on_timer_event(event).await,
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                player.advance_editor();
            }
        }
        if player.state() == PlayerState::Closed {
            break;
        }
    }
    player
}

#[cfg(test)]
mod tests {
    use super::*;

    #[codio_test_utils::logged_test]
    fn parses_transport_lines() {
        assert_eq!("pause".parse(), Ok(TransportCommand::Pause));
        assert_eq!(" Toggle ".parse(), Ok(TransportCommand::PauseOrResume));
        assert_eq!(
            "rewind".parse(),
            Ok(TransportCommand::Rewind { secs: None })
        );
        assert_eq!(
            "forward 30".parse(),
            Ok(TransportCommand::Forward { secs: Some(30) })
        );
        assert_eq!("goto 1:30".parse(), Ok(TransportCommand::Goto { ms: 90_000 }));
        assert_eq!("play".parse(), Ok(TransportCommand::Play { from_ms: 0 }));
        assert_eq!("seek 2500".parse(), Ok(TransportCommand::Seek { ms: 2500 }));
    }

    #[codio_test_utils::logged_test]
    fn rejects_malformed_lines() {
        for line in ["", "dance", "seek", "seek abc", "pause now", "rewind -3", "goto 1 2"] {
            assert!(line.parse::<TransportCommand>().is_err(), "{line:?} should not parse");
        }
    }

    #[codio_test_utils::logged_test]
    fn offsets_accept_clock_notation() {
        assert_eq!(parse_offset_ms("750"), Some(750));
        assert_eq!(parse_offset_ms("0:05"), Some(5000));
        assert_eq!(parse_offset_ms("1:02:03"), Some(3_723_000));
        assert_eq!(parse_offset_ms("1::3"), None);
    }
}
