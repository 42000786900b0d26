// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TOML layers, normalized to JSON for merging

use anyhow::{Context, Result};
use serde_json::Value as J;
use std::path::Path;

pub fn parse_toml_to_json(toml_str: &str) -> Result<J> {
    let toml: toml::Value = toml_str.parse::<toml::Value>()?;
    serde_json::to_value(toml).context("converting TOML to JSON")
}

/// Read a layer, or `None` if the file does not exist.
pub fn read_layer_from_file(path: &Path) -> Result<Option<J>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading config file {:?}", path)),
    };
    parse_toml_to_json(&content)
        .with_context(|| format!("parsing config file {:?}", path))
        .map(Some)
}
