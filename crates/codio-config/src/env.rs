// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Environment and command-line overlays

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value as J;

use crate::merge::{insert_dotted, kebab_keys};

/// Overlay from `CODIO_<SECTION>__<KEY>` variables of the process
/// environment, e.g. `CODIO_PLAYER__TICK_MS=100` sets `player.tick-ms`.
pub fn env_overlay() -> Result<J> {
    env_overlay_from(None)
}

/// Same as [`env_overlay`], reading `vars` instead of the process
/// environment when given.
pub fn env_overlay_from(vars: Option<HashMap<String, String>>) -> Result<J> {
    let built = config::Config::builder()
        .add_source(
            config::Environment::with_prefix("CODIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(vars),
        )
        .build()?;

    let map = built.try_deserialize::<serde_json::Map<String, J>>()?;
    // CODIO_HOME names a directory, not a setting.
    let mut overlay = kebab_keys(J::Object(map));
    if let J::Object(map) = &mut overlay {
        map.remove("home");
    }
    Ok(overlay)
}

/// Overlay from `key=value` flags. Values that parse as JSON scalars
/// (`true`, `250`) keep their type, anything else is a string.
pub fn flags_overlay(kv_pairs: &[(&str, &str)]) -> J {
    let mut root = serde_json::json!({});
    for (key, raw) in kv_pairs {
        let value = match serde_json::from_str::<J>(raw) {
            Ok(parsed) if !parsed.is_object() && !parsed.is_array() => parsed,
            _ => J::String(raw.to_string()),
        };
        insert_dotted(&mut root, key, value);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[codio_test_utils::logged_test]
    fn env_vars_nest_on_double_underscore() {
        let vars = HashMap::from([
            ("CODIO_PLAYER__TICK_MS".to_string(), "100".to_string()),
            ("CODIO_AUDIO__PLAYER_PROGRAM".to_string(), "mpv".to_string()),
            ("CODIO_HOME".to_string(), "/tmp/codio".to_string()),
            ("OTHER_PLAYER__TICK_MS".to_string(), "1".to_string()),
        ]);
        let overlay = env_overlay_from(Some(vars)).unwrap();
        assert_eq!(
            overlay,
            json!({"player": {"tick-ms": 100}, "audio": {"player-program": "mpv"}})
        );
    }

    #[codio_test_utils::logged_test]
    fn flag_values_keep_scalar_types() {
        let overlay = flags_overlay(&[
            ("player.audio", "false"),
            ("player.skip-secs", "5"),
            ("audio.input-device", "hw:1"),
        ]);
        assert_eq!(
            overlay,
            json!({
                "player": {"audio": false, "skip-secs": 5},
                "audio": {"input-device": "hw:1"}
            })
        );
    }
}
