// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use codio_timeline::{Metadata, SessionDir, Timeline, TimelineError};
use serde_json::json;

use crate::format_offset;

#[derive(Args)]
pub struct InspectArgs {
    /// Session directory
    pub session: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// What a session holds, without replaying it.
#[derive(Debug)]
pub struct Summary {
    pub metadata: Option<Metadata>,
    pub total_ms: u64,
    pub documents: Vec<String>,
    pub events_by_type: BTreeMap<&'static str, usize>,
    pub audio: bool,
    pub subtitles: bool,
}

impl Summary {
    pub async fn read(session: &SessionDir) -> Result<Self> {
        let timeline = session
            .load_timeline()
            .await
            .with_context(|| format!("failed to read session {}", session.root().display()))?;
        let metadata = match session.load_metadata().await {
            Ok(metadata) => Some(metadata),
            Err(TimelineError::MissingSession(_)) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            metadata,
            audio: SessionDir::existing(session.audio_path()).await.is_some(),
            subtitles: SessionDir::existing(session.subtitles_path()).await.is_some(),
            ..Self::from_timeline(&timeline)
        })
    }

    fn from_timeline(timeline: &Timeline<String>) -> Self {
        let mut documents: Vec<String> = timeline.documents().cloned().collect();
        documents.sort();
        documents.dedup();

        let mut events_by_type = BTreeMap::new();
        for event in &timeline.events {
            *events_by_type.entry(event.kind.type_name()).or_default() += 1;
        }

        Self {
            metadata: None,
            total_ms: timeline.total_duration_ms,
            documents,
            events_by_type,
            audio: false,
            subtitles: false,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        json!({
            "name": self.metadata.as_ref().map(|m| m.name.as_str()),
            "version": self.metadata.as_ref().map(|m| m.version.as_str()),
            "totalDurationMs": self.total_ms,
            "documents": self.documents,
            "events": self.events_by_type,
            "audio": self.audio,
            "subtitles": self.subtitles,
        })
    }
}

impl InspectArgs {
    pub async fn run(&self) -> Result<()> {
        let summary = Summary::read(&SessionDir::new(&self.session)).await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
            return Ok(());
        }

        let name = summary.metadata.as_ref().map_or("(unnamed)", |m| m.name.as_str());
        println!("{name}  {}", format_offset(summary.total_ms));
        println!("audio: {}  subtitles: {}", yes_no(summary.audio), yes_no(summary.subtitles));
        println!("documents:");
        for document in &summary.documents {
            println!("  {document}");
        }
        println!("events:");
        for (kind, count) in &summary.events_by_type {
            println!("  {kind:<22} {count}");
        }
        Ok(())
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
