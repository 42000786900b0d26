// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layered configuration for codio.
//!
//! Layers are merged as JSON, lowest precedence first:
//! built-in defaults < user file < repo file < environment < flags.
//! The merged document is then deserialized into [`CodioConfig`].

pub mod env;
pub mod loader;
pub mod merge;
pub mod paths;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as J;
use tracing::debug;

pub use paths::{Paths, discover_paths};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CodioConfig {
    pub player: PlayerConfig,
    pub audio: AudioConfig,
    pub recorder: RecorderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PlayerConfig {
    /// Progress tick interval in milliseconds.
    pub tick_ms: u64,
    /// Step used by rewind and forward when no amount is given.
    pub skip_secs: u64,
    /// Play the narration track when the session has one.
    pub audio: bool,
    /// Show captions when the session has a subtitle track.
    pub subtitles: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            skip_secs: 10,
            audio: true,
            subtitles: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AudioConfig {
    pub player_program: String,
    pub capture_program: String,
    /// Input format passed to the capture program's `-f`.
    pub input_format: String,
    pub input_device: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let (input_format, input_device) = if cfg!(target_os = "macos") {
            ("avfoundation", ":0")
        } else if cfg!(target_os = "windows") {
            ("dshow", "audio=default")
        } else {
            ("pulse", "default")
        };
        Self {
            player_program: "ffplay".into(),
            capture_program: "ffmpeg".into(),
            input_format: input_format.into(),
            input_device: input_device.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RecorderConfig {
    /// Capture narration while recording.
    pub audio: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self { audio: true }
    }
}

/// Merge every layer and deserialize the result.
pub fn load(paths: &Paths, flags: &[(&str, &str)]) -> Result<CodioConfig> {
    load_with_env(paths, env::env_overlay()?, flags)
}

/// [`load`] with an explicit environment overlay.
pub fn load_with_env(paths: &Paths, env_layer: J, flags: &[(&str, &str)]) -> Result<CodioConfig> {
    let mut json = serde_json::to_value(CodioConfig::default())?;

    for path in [&paths.user, &paths.repo].into_iter().flatten() {
        if let Some(layer) = loader::read_layer_from_file(path)? {
            debug!(path = %path.display(), "applying config layer");
            merge::merge_two_json(&mut json, layer);
        }
    }
    merge::merge_two_json(&mut json, env_layer);
    merge::merge_two_json(&mut json, env::flags_overlay(flags));

    serde_json::from_value(json).context("invalid codio configuration")
}

/// Split `key=value` flag arguments.
pub fn parse_flag(arg: &str) -> Result<(String, String)> {
    let (key, value) = arg
        .split_once('=')
        .with_context(|| format!("expected key=value, got {arg:?}"))?;
    anyhow::ensure!(!key.trim().is_empty(), "empty key in {arg:?}");
    Ok((key.trim().to_string(), value.to_string()))
}
