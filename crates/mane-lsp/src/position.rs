//! LSP position types and UTF-16 coordinate conversion.
//!
//! The protocol measures `Position.character` in UTF-16 code units while the
//! editor works in chars. Conversions happen at this boundary only; nothing
//! above the coordinator ever sees a UTF-16 offset.

use mane_core::LineIndex;
use serde::{Deserialize, Serialize};

/// An LSP position: 0-based line, 0-based UTF-16 character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-based).
    pub line: u32,
    /// Character offset within the line, in UTF-16 code units.
    pub character: u32,
}

impl Position {
    /// Create a position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// An LSP range: start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Convert a char offset within `line_text` to UTF-16 code units.
pub fn char_to_utf16(line_text: &str, char_offset: usize) -> usize {
    line_text
        .chars()
        .take(char_offset)
        .map(|c| c.len_utf16())
        .sum()
}

/// Convert a UTF-16 code unit offset within `line_text` to a char offset.
///
/// Offsets past the end of the line clamp to its length.
pub fn utf16_to_char(line_text: &str, utf16_offset: usize) -> usize {
    let mut units = 0usize;
    let mut chars = 0usize;
    for ch in line_text.chars() {
        if units >= utf16_offset {
            break;
        }
        units += ch.len_utf16();
        chars += 1;
    }
    chars
}

/// Convert a document-wide char offset into an LSP [`Position`].
pub fn offset_to_position(index: &LineIndex, char_offset: usize) -> Position {
    let line = index.char_to_line(char_offset);
    let col = char_offset - index.line_to_char(line);
    let line_text = index.line_text(line).unwrap_or_default();
    let character = char_to_utf16(&line_text, col);
    Position::new(line as u32, character as u32)
}

/// Convert an LSP [`Position`] into a document-wide char offset.
///
/// Out-of-range lines and characters clamp to the document.
pub fn position_to_offset(index: &LineIndex, pos: Position) -> usize {
    let line = (pos.line as usize).min(index.line_count().saturating_sub(1));
    let line_text = index.line_text(line).unwrap_or_default();
    let col = utf16_to_char(&line_text, pos.character as usize);
    index.line_to_char(line) + col.min(index.line_len(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii_is_identity() {
        assert_eq!(char_to_utf16("hello", 3), 3);
        assert_eq!(utf16_to_char("hello", 3), 3);
    }

    #[test]
    fn test_astral_chars_count_two_units() {
        // U+1F600 occupies two UTF-16 code units but one char.
        let text = "a\u{1F600}b";
        assert_eq!(char_to_utf16(text, 2), 3);
        assert_eq!(utf16_to_char(text, 3), 2);
        assert_eq!(utf16_to_char(text, 1), 1);
    }

    #[test]
    fn test_clamps_past_line_end() {
        assert_eq!(utf16_to_char("ab", 99), 2);
    }

    #[test]
    fn test_offset_position_roundtrip() {
        let index = LineIndex::from_text("fn main() {\n    let s = \"\u{1F600}\";\n}");
        for offset in [0, 5, 12, 25, 30] {
            let pos = offset_to_position(&index, offset);
            assert_eq!(position_to_offset(&index, pos), offset);
        }
    }

    #[test]
    fn test_position_to_offset_clamps() {
        let index = LineIndex::from_text("ab\ncd");
        let pos = Position::new(9, 9);
        assert_eq!(position_to_offset(&index, pos), 5);
    }
}
