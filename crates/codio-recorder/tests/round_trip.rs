// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use codio_audio::{AudioProcess, CaptureBackend};
use codio_player::EditorPlayer;
use codio_recorder::{AudioCapture, Recorder, save};
use codio_timeline::{
    DocumentId, EventKind, FrameFile, FsWorkspace, Position, Range, SessionDir, ShadowDocument,
    TextChange, ViewColumn,
};
use tokio::time::advance;

const ROOT: &str = "/work/project";

fn doc(name: &str) -> DocumentId {
    DocumentId::new(format!("{ROOT}/{name}"))
}

#[codio_test_utils::logged_tokio_test(start_paused = true)]
async fn replay_reproduces_what_was_typed() {
    let mut recorder = Recorder::new();
    let mut live = ShadowDocument::new("fn main() {}\n");
    recorder
        .start(vec![FrameFile::new(doc("main.rs"), live.text(), ViewColumn(1))])
        .await
        .unwrap();

    let edits = [
        (400, TextChange::insert(Position::new(0, 11), " println!(); ")),
        (900, TextChange::replace(Range::new(Position::new(0, 3), Position::new(0, 7)), "start")),
        (2500, TextChange::insert(Position::new(1, 0), "// done\n")),
    ];
    let mut observed = Vec::new();
    for (step_ms, change) in edits {
        advance(Duration::from_millis(step_ms)).await;
        live.apply(&change);
        let time = recorder
            .record(EventKind::DocumentChange {
                document: doc("main.rs"),
                changes: vec![change],
            })
            .unwrap();
        observed.push((time, live.text().to_string()));
        if time == 400 {
            recorder.pause().await.unwrap();
            advance(Duration::from_secs(60)).await;
            recorder.resume().await.unwrap();
        }
    }
    advance(Duration::from_millis(100)).await;
    let recording = recorder.finish().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let session = SessionDir::new(dir.path().join("demo"));
    let metadata = save(recording, &FsWorkspace::new(ROOT), &session, "demo")
        .await
        .unwrap();
    assert_eq!(metadata.length, 400 + 900 + 2500 + 100);

    let timeline = session.load_timeline().await.unwrap();
    let replay_root = session.workspace_dir();
    assert_eq!(
        tokio::fs::read_to_string(replay_root.join("main.rs")).await.unwrap(),
        "fn main() {}\n"
    );

    let workspace = FsWorkspace::new(&replay_root);
    let replayed = DocumentId::new(replay_root.join("main.rs"));
    let mut player = EditorPlayer::load(&workspace, &timeline).unwrap();
    for (time, text) in &observed {
        player.materialize(*time);
        assert_eq!(player.frame().text(&replayed), Some(text.as_str()), "at {time}ms");
    }

    let mut rebuilt = EditorPlayer::load(&workspace, &timeline).unwrap();
    rebuilt.materialize(metadata.length);
    player.materialize(metadata.length);
    assert_eq!(rebuilt.frame(), player.frame());
}

#[codio_test_utils::logged_tokio_test(start_paused = true)]
async fn documents_outside_the_workspace_are_not_saved() {
    let mut recorder = Recorder::new();
    recorder
        .start(vec![
            FrameFile::new(doc("a.txt"), "a", ViewColumn(1)),
            FrameFile::new(DocumentId::new("/tmp/scratch.txt"), "s", ViewColumn(2)),
        ])
        .await
        .unwrap();
    advance(Duration::from_millis(10)).await;
    recorder.record(EventKind::Close {
        document: DocumentId::new("/tmp/scratch.txt"),
    });
    let recording = recorder.finish().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let session = SessionDir::new(dir.path());
    save(recording, &FsWorkspace::new(ROOT), &session, "partial")
        .await
        .unwrap();

    let timeline = session.load_timeline().await.unwrap();
    let paths: Vec<_> = timeline.documents().cloned().collect();
    assert_eq!(paths, vec!["a.txt".to_string()]);
    assert_eq!(session.load_metadata().await.unwrap().name, "partial");
}

#[derive(Default)]
struct FakeCapture {
    calls: Mutex<Vec<String>>,
    start_delay: Duration,
}

#[async_trait]
impl CaptureBackend for FakeCapture {
    async fn record(&self, destination: &Path) -> anyhow::Result<(AudioProcess, u64)> {
        tokio::fs::write(destination, b"ID3").await?;
        tokio::time::sleep(self.start_delay).await;
        self.calls.lock().unwrap().push("record".into());
        Ok((AudioProcess::detached(4242), self.start_delay.as_millis() as u64))
    }

    async fn pause(&self, pid: u32) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("pause {pid}"));
        Ok(())
    }

    async fn resume(&self, pid: u32) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("resume {pid}"));
        Ok(())
    }

    async fn stop(&self, pid: u32, _process: AudioProcess) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("stop {pid}"));
        Ok(())
    }
}

#[codio_test_utils::logged_tokio_test(start_paused = true)]
async fn narration_follows_the_recording_clock() {
    let dir = tempfile::tempdir().unwrap();
    let capture = Arc::new(FakeCapture::default());
    let scratch = dir.path().join("capture").join("narration.mp3");
    let mut recorder =
        Recorder::new().with_audio(AudioCapture::new(capture.clone(), scratch.clone()));

    recorder.start(Vec::new()).await.unwrap();
    recorder.pause().await.unwrap();
    recorder.pause().await.unwrap();
    recorder.resume().await.unwrap();
    advance(Duration::from_millis(50)).await;
    let recording = recorder.finish().await.unwrap();
    assert_eq!(recording.audio.as_deref(), Some(scratch.as_path()));

    let session = SessionDir::new(dir.path().join("session"));
    save(recording, &FsWorkspace::new(ROOT), &session, "narrated")
        .await
        .unwrap();
    assert_eq!(tokio::fs::read(session.audio_path()).await.unwrap(), b"ID3");
    assert_eq!(
        *capture.calls.lock().unwrap(),
        ["record", "pause 4242", "resume 4242", "stop 4242"]
    );
}

#[codio_test_utils::logged_tokio_test(start_paused = true)]
async fn recording_clock_starts_once_capture_is_up() {
    let dir = tempfile::tempdir().unwrap();
    let capture = Arc::new(FakeCapture {
        start_delay: Duration::from_millis(400),
        ..FakeCapture::default()
    });
    let mut recorder = Recorder::new().with_audio(AudioCapture::new(
        capture,
        dir.path().join("narration.mp3"),
    ));

    recorder.start(Vec::new()).await.unwrap();
    assert_eq!(recorder.elapsed_ms(), 0);

    advance(Duration::from_millis(100)).await;
    let typed = EventKind::ExecutionOutput {
        output: "ok".into(),
    };
    assert_eq!(recorder.record(typed), Some(100));
}
