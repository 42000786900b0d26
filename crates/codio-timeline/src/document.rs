// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::text::{Position, TextChange};

/// Identity of a live document: its absolute location on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(PathBuf);

impl DocumentId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

/// In-memory copy of a document's text that edits are replayed onto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShadowDocument {
    text: String,
}

impl ShadowDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Byte offset of `position`.
    ///
    /// Positions past the end of a line clamp to the line end (before any
    /// `\r\n`) and lines past the end of the document clamp to its end. A
    /// column landing inside a surrogate pair rounds up to the next char.
    pub fn offset_at(&self, position: Position) -> usize {
        let text = self.text.as_str();
        let mut line_start = 0;
        for _ in 0..position.line {
            match text[line_start..].find('\n') {
                Some(newline) => line_start += newline + 1,
                None => return text.len(),
            }
        }

        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |newline| line_start + newline);
        let content_end = if line_end > line_start && text[..line_end].ends_with('\r') {
            line_end - 1
        } else {
            line_end
        };

        let mut units = 0u32;
        for (index, ch) in text[line_start..content_end].char_indices() {
            if units >= position.character {
                return line_start + index;
            }
            units += ch.len_utf16() as u32;
        }
        content_end
    }

    /// Replace the text covered by `change.range` with `change.text`.
    pub fn apply(&mut self, change: &TextChange) {
        let start = self.offset_at(change.range.start);
        let end = self.offset_at(change.range.end);
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        self.text.replace_range(start..end, &change.text);
    }

    /// Apply `changes` one after another, each against the result of the
    /// previous one.
    pub fn apply_all<'a>(&mut self, changes: impl IntoIterator<Item = &'a TextChange>) {
        for change in changes {
            self.apply(change);
        }
    }
}

impl From<String> for ShadowDocument {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for ShadowDocument {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Range;

    fn at(line: u32, character: u32) -> Position {
        Position::new(line, character)
    }

    #[codio_test_utils::logged_test]
    fn insert_into_empty_document() {
        let mut doc = ShadowDocument::default();
        doc.apply(&TextChange::insert(at(0, 0), "x"));
        assert_eq!(doc.text(), "x");
        doc.apply(&TextChange::insert(at(0, 0), "y"));
        assert_eq!(doc.text(), "yx");
    }

    #[codio_test_utils::logged_test]
    fn replace_across_lines() {
        let mut doc = ShadowDocument::new("fn main() {\n    old();\n}\n");
        doc.apply(&TextChange::replace(
            Range::new(at(0, 10), at(2, 0)),
            "{ new(); ",
        ));
        assert_eq!(doc.text(), "fn main() { new(); }\n");
    }

    #[codio_test_utils::logged_test]
    fn columns_count_utf16_units() {
        // 'é' is one UTF-16 unit but two bytes; '😀' is two units and four bytes.
        let doc = ShadowDocument::new("é😀z");
        assert_eq!(doc.offset_at(at(0, 1)), 2);
        assert_eq!(doc.offset_at(at(0, 3)), 6);
        // Halfway through the surrogate pair rounds up past the emoji.
        assert_eq!(doc.offset_at(at(0, 2)), 6);
    }

    #[codio_test_utils::logged_test]
    fn out_of_range_positions_clamp() {
        let doc = ShadowDocument::new("ab\r\ncd");
        assert_eq!(doc.offset_at(at(0, 99)), 2, "clamps before CRLF");
        assert_eq!(doc.offset_at(at(1, 1)), 5);
        assert_eq!(doc.offset_at(at(7, 0)), doc.text().len());
    }

    #[codio_test_utils::logged_test]
    fn reversed_range_is_normalized() {
        let mut doc = ShadowDocument::new("hello world");
        doc.apply(&TextChange::replace(Range::new(at(0, 11), at(0, 5)), ""));
        assert_eq!(doc.text(), "hello");
    }

    #[codio_test_utils::logged_test]
    fn changes_apply_sequentially() {
        let mut doc = ShadowDocument::new("abc");
        let changes = [
            TextChange::insert(at(0, 3), "d"),
            TextChange::replace(Range::new(at(0, 0), at(0, 1)), "A"),
        ];
        doc.apply_all(&changes);
        assert_eq!(doc.text(), "Abcd");
    }
}
