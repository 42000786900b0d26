// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! SRT captions.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::error::SubtitleError;
use crate::tracks::SubtitleTrack;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Parse SubRip text. Cue numbers are optional and ignored.
pub fn parse_srt(input: &str) -> Result<Vec<Cue>, SubtitleError> {
    let mut cues = Vec::new();
    let mut lines = input.lines().enumerate().peekable();

    while let Some((index, line)) = lines.next() {
        let line = line.trim_start_matches('\u{feff}').trim();
        let Some((start, end)) = line.split_once("-->") else {
            continue;
        };
        let start_ms = parse_timestamp(start.trim(), index + 1)?;
        let end_ms = parse_timestamp(end.trim(), index + 1)?;

        let mut text = Vec::new();
        while let Some((_, body)) = lines.next_if(|(_, l)| !l.trim().is_empty()) {
            text.push(body.trim_end());
        }
        cues.push(Cue {
            start_ms,
            end_ms: end_ms.max(start_ms),
            text: text.join("\n"),
        });
    }

    cues.sort_by_key(|cue| cue.start_ms);
    Ok(cues)
}

/// `HH:MM:SS,mmm`, also accepting `.` before the milliseconds.
fn parse_timestamp(value: &str, line: usize) -> Result<u64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp {
        line,
        value: value.to_string(),
    };
    // Positioning hints may follow the end timestamp.
    let value_only = value.split_whitespace().next().ok_or_else(invalid)?;
    let (clock, millis) = value_only
        .split_once([',', '.'])
        .ok_or_else(invalid)?;
    let mut parts = clock.split(':').map(|part| part.parse::<u64>());
    let (Some(Ok(h)), Some(Ok(m)), Some(Ok(s)), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let millis: u64 = millis.parse().map_err(|_| invalid())?;
    h.checked_mul(60)
        .and_then(|v| v.checked_add(m))
        .and_then(|v| v.checked_mul(60))
        .and_then(|v| v.checked_add(s))
        .and_then(|v| v.checked_mul(1000))
        .and_then(|v| v.checked_add(millis))
        .ok_or_else(invalid)
}

/// Caption track publishing the visible caption on a watch channel.
pub struct Subtitles {
    cues: Arc<Vec<Cue>>,
    caption: watch::Sender<Option<String>>,
    task: Option<JoinHandle<()>>,
}

impl Subtitles {
    pub fn new(cues: Vec<Cue>) -> Self {
        let (caption, _) = watch::channel(None);
        Self {
            cues: Arc::new(cues),
            caption,
            task: None,
        }
    }

    pub async fn load(path: &Path) -> Result<Self, SubtitleError> {
        let text = tokio::fs::read_to_string(path).await?;
        let cues = parse_srt(&text)?;
        debug!(path = %path.display(), cues = cues.len(), "subtitles loaded");
        Ok(Self::new(cues))
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.caption.subscribe()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn cue_at(&self, offset_ms: u64) -> Option<&Cue> {
        cue_at(&self.cues, offset_ms)
    }

    fn halt(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn cue_at(cues: &[Cue], offset_ms: u64) -> Option<&Cue> {
    cues.iter()
        .rev()
        .find(|cue| cue.start_ms <= offset_ms && offset_ms < cue.end_ms)
}

fn caption_at(cues: &[Cue], offset_ms: u64) -> Option<String> {
    cue_at(cues, offset_ms).map(|cue| cue.text.clone())
}

impl SubtitleTrack for Subtitles {
    fn play(&mut self, offset_ms: u64, anchor: Instant) {
        self.halt();
        self.caption.send_replace(caption_at(&self.cues, offset_ms));

        let mut boundaries: Vec<u64> = self
            .cues
            .iter()
            .flat_map(|cue| [cue.start_ms, cue.end_ms])
            .filter(|&boundary| boundary > offset_ms)
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        let cues = Arc::clone(&self.cues);
        let caption = self.caption.clone();
        self.task = Some(tokio::spawn(async move {
            for boundary in boundaries {
                let due = anchor + std::time::Duration::from_millis(boundary - offset_ms);
                tokio::time::sleep_until(due).await;
                caption.send_if_modified(|current| {
                    let next = caption_at(&cues, boundary);
                    let changed = *current != next;
                    *current = next;
                    changed
                });
            }
        }));
    }

    fn pause(&mut self) {
        self.halt();
    }

    fn stop(&mut self) {
        self.halt();
        self.caption.send_replace(None);
    }
}

impl Drop for Subtitles {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SRT: &str = "\u{feff}1\n00:00:01,000 --> 00:00:02,500\nHello\n\n2\n00:00:03.000 --> 00:00:04,000 X1:10\nTwo\nlines\n";

    #[codio_test_utils::logged_test]
    fn parses_cues_with_multiline_text() {
        let cues = parse_srt(SRT).unwrap();
        assert_eq!(
            cues,
            vec![
                Cue {
                    start_ms: 1000,
                    end_ms: 2500,
                    text: "Hello".into()
                },
                Cue {
                    start_ms: 3000,
                    end_ms: 4000,
                    text: "Two\nlines".into()
                },
            ]
        );
    }

    #[codio_test_utils::logged_test]
    fn rejects_garbled_timestamps() {
        let err = parse_srt("1\n00:00:xx,000 --> 00:00:02,000\nHi\n").unwrap_err();
        assert!(matches!(err, SubtitleError::InvalidTimestamp { line: 2, .. }));

        let err =
            parse_srt("1\n99999999999999999:00:00,000 --> 99999999999999999:00:01,000\nHi\n")
                .unwrap_err();
        assert!(matches!(err, SubtitleError::InvalidTimestamp { line: 2, .. }));
    }

    #[codio_test_utils::logged_test]
    fn cue_lookup_uses_half_open_intervals() {
        let subtitles = Subtitles::new(parse_srt(SRT).unwrap());
        assert_eq!(subtitles.cue_at(999), None);
        assert_eq!(subtitles.cue_at(1000).map(|c| c.text.as_str()), Some("Hello"));
        assert_eq!(subtitles.cue_at(2500), None);
    }

    #[codio_test_utils::logged_tokio_test(start_paused = true)]
    async fn captions_follow_the_clock_and_freeze_on_pause() {
        let mut subtitles = Subtitles::new(parse_srt(SRT).unwrap());
        let captions = subtitles.subscribe();

        subtitles.play(500, Instant::now());
        assert_eq!(*captions.borrow(), None);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(captions.borrow().as_deref(), Some("Hello"));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(*captions.borrow(), None);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(captions.borrow().as_deref(), Some("Two\nlines"));

        subtitles.pause();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(captions.borrow().as_deref(), Some("Two\nlines"));

        subtitles.stop();
        assert_eq!(*captions.borrow(), None);
    }
}
