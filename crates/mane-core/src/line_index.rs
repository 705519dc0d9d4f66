//! Rope-based line index.
//!
//! Provides (line, column) <-> offset conversions over a text snapshot using
//! a [`ropey::Rope`]. Columns are measured in chars; the index also maps
//! between char and byte offsets for callers that keep byte-based edit logs.

use ropey::Rope;

/// Line/column and offset conversions for one text snapshot.
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Build a line index from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total line count. An empty document has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total char count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Get the text of line `line` without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let mut text = self.rope.line(line).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        Some(text)
    }

    /// Char length of line `line` excluding its trailing newline.
    pub fn line_len(&self, line: usize) -> usize {
        self.line_text(line).map_or(0, |l| l.chars().count())
    }

    /// Char offset of the first char of line `line` (clamped to the last line).
    pub fn line_to_char(&self, line: usize) -> usize {
        let clamped = line.min(self.rope.len_lines().saturating_sub(1));
        self.rope.line_to_char(clamped)
    }

    /// Line containing the char at `offset` (clamped).
    pub fn char_to_line(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    /// Convert (line, column-in-chars) to a char offset.
    ///
    /// The column is clamped to the line length, the line to the last line.
    pub fn position_to_char(&self, line: usize, column: usize) -> usize {
        let line = line.min(self.rope.len_lines().saturating_sub(1));
        let start = self.rope.line_to_char(line);
        start + column.min(self.line_len(line))
    }

    /// Convert a char offset to (line, column-in-chars).
    pub fn char_to_position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        (line, offset - self.rope.line_to_char(line))
    }

    /// Convert a char offset to a byte offset.
    pub fn char_to_byte(&self, offset: usize) -> usize {
        self.rope.char_to_byte(offset.min(self.rope.len_chars()))
    }

    /// Convert a byte offset to a char offset.
    pub fn byte_to_char(&self, offset: usize) -> usize {
        self.rope.byte_to_char(offset.min(self.rope.len_bytes()))
    }
}
