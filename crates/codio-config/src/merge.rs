// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON layer merging

use serde_json::Value as J;

/// Deep-merge `layer` onto `base`.
///
/// Objects merge recursively. Scalars and arrays from `layer` replace the
/// base value. A `null` in `layer` leaves the base untouched.
pub fn merge_two_json(base: &mut J, layer: J) {
    match (base, layer) {
        (J::Object(a), J::Object(b)) => {
            for (k, v) in b {
                merge_two_json(a.entry(k).or_insert(J::Null), v);
            }
        }
        (_, J::Null) => {}
        (a, b) => *a = b,
    }
}

/// Set `value` at a dotted key such as `player.tick-ms`, creating
/// intermediate objects and overwriting non-object values on the way.
pub fn insert_dotted(root: &mut J, dotted: &str, value: J) {
    let mut cur = root;
    let mut parts = dotted.split('.').peekable();
    while let Some(part) = parts.next() {
        if !cur.is_object() {
            *cur = J::Object(Default::default());
        }
        let J::Object(map) = cur else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return;
        }
        cur = map
            .entry(part.to_string())
            .or_insert_with(|| J::Object(Default::default()));
    }
}

/// Rewrite object keys from `snake_case` to `kebab-case`, recursively.
pub fn kebab_keys(value: J) -> J {
    match value {
        J::Object(map) => J::Object(
            map.into_iter()
                .map(|(k, v)| (k.replace('_', "-"), kebab_keys(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[codio_test_utils::logged_test]
    fn objects_merge_and_scalars_replace() {
        let mut base = json!({"player": {"tick-ms": 250, "audio": true}, "audio": {"player-program": "ffplay"}});
        merge_two_json(
            &mut base,
            json!({"player": {"tick-ms": 100, "audio": null}}),
        );
        assert_eq!(
            base,
            json!({"player": {"tick-ms": 100, "audio": true}, "audio": {"player-program": "ffplay"}})
        );
    }

    #[codio_test_utils::logged_test]
    fn dotted_insert_creates_parents() {
        let mut root = json!({"player": 3});
        insert_dotted(&mut root, "player.skip-secs", json!(5));
        insert_dotted(&mut root, "recorder.audio", json!(false));
        assert_eq!(
            root,
            json!({"player": {"skip-secs": 5}, "recorder": {"audio": false}})
        );
    }

    #[codio_test_utils::logged_test]
    fn kebab_keys_only_touches_keys() {
        assert_eq!(
            kebab_keys(json!({"player": {"tick_ms": "a_b"}})),
            json!({"player": {"tick-ms": "a_b"}})
        );
    }
}
