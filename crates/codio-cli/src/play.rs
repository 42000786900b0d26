// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use codio_audio::{FfplayBackend, PlaybackBackend};
use codio_config::CodioConfig;
use codio_player::{
    OpenOptions, PlaybackSource, Player, PlayerHandle, PlayerSettings, TransportCommand, session,
};
use codio_timeline::SessionDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{format_offset, parse_offset};

#[derive(Args)]
pub struct PlayArgs {
    /// Session directory
    pub session: PathBuf,

    /// Start offset, in milliseconds or m:ss
    #[arg(long, value_parser = parse_offset, default_value = "0")]
    pub from: u64,

    /// Replay against this directory instead of the session's workspace copy
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Play without narration
    #[arg(long)]
    pub no_audio: bool,

    /// Play without captions
    #[arg(long)]
    pub no_subtitles: bool,
}

impl PlayArgs {
    pub async fn run(&self, config: &CodioConfig) -> Result<()> {
        let session = SessionDir::new(&self.session);
        let options = OpenOptions {
            workspace: self.workspace.clone(),
            audio: (config.player.audio && !self.no_audio).then(|| {
                Arc::new(FfplayBackend::new(&config.audio.player_program)) as Arc<dyn PlaybackBackend>
            }),
            subtitles: config.player.subtitles && !self.no_subtitles,
        };
        let source = PlaybackSource::open(&session, options)
            .await
            .with_context(|| format!("failed to open session {}", self.session.display()))?;

        let (mut player, timer_events) = Player::new(settings(config));
        player.load(source).await?;
        let total_ms = player.total_ms();
        let (handle, task) = session::spawn(player, timer_events);
        handle.send(TransportCommand::Play { from_ms: self.from })?;
        info!(session = %self.session.display(), from_ms = self.from, "playback started");

        tokio::spawn(forward_stdin(handle.clone()));
        report(&handle, total_ms).await;

        let player = task.await?;
        println!(
            "finished at {} / {}",
            format_offset(player.relative_active_ms()),
            format_offset(total_ms)
        );
        Ok(())
    }
}

fn settings(config: &CodioConfig) -> PlayerSettings {
    PlayerSettings {
        tick: Duration::from_millis(config.player.tick_ms.max(1)),
        skip_secs: config.player.skip_secs,
    }
}

/// Send each line read from stdin to the player as a transport command.
async fn forward_stdin(handle: PlayerHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<TransportCommand>() {
            Ok(command) => {
                if handle.send(command).is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("{e}; try pause, resume, toggle, rewind N, forward N, seek MS, goto MS or stop"),
        }
    }
}

/// Print progress once per second and every caption change until the
/// session closes.
async fn report(handle: &PlayerHandle, total_ms: u64) {
    let mut progress = handle.progress();
    let mut captions = handle.captions();
    let mut last_second = None;
    loop {
        tokio::select! {
            () = handle.finished() => break,
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
                let current_ms = progress.borrow_and_update().current_ms;
                let second = current_ms / 1000;
                if last_second != Some(second) {
                    last_second = Some(second);
                    println!("{} / {}", format_offset(current_ms), format_offset(total_ms));
                }
            }
            Some(caption) = next_caption(&mut captions) => {
                if let Some(text) = caption {
                    println!("> {text}");
                }
            }
        }
    }
}

async fn next_caption(
    captions: &mut Option<watch::Receiver<Option<String>>>,
) -> Option<Option<String>> {
    let Some(receiver) = captions.as_mut() else {
        return std::future::pending().await;
    };
    if receiver.changed().await.is_err() {
        *captions = None;
        return None;
    }
    Some(receiver.borrow_and_update().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[codio_test_utils::logged_test]
    fn settings_follow_configuration() {
        let mut config = CodioConfig::default();
        config.player.tick_ms = 0;
        config.player.skip_secs = 5;
        let settings = settings(&config);
        assert_eq!(settings.tick, Duration::from_millis(1));
        assert_eq!(settings.skip_secs, 5);
    }

    #[codio_test_utils::logged_tokio_test]
    async fn captions_end_when_the_track_goes_away() {
        let (tx, rx) = watch::channel(None);
        let mut captions = Some(rx);
        tx.send_replace(Some("hello".to_string()));
        assert_eq!(next_caption(&mut captions).await, Some(Some("hello".to_string())));
        drop(tx);
        assert_eq!(next_caption(&mut captions).await, None);
        assert!(captions.is_none());
    }
}
