//! Rectangular (block) selection.
//!
//! A block selection spans a column range across consecutive lines. Lines
//! and columns are measured in chars on each line. Block mode and
//! multi-cursor mode are mutually exclusive; the editor binding enforces
//! that boundary.

use crate::text::split_lines;

/// A normalized rectangular selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSelection {
    /// First line of the rectangle (inclusive).
    pub start_line: usize,
    /// Last line of the rectangle (inclusive).
    pub end_line: usize,
    /// Left column (inclusive), in chars.
    pub start_col: usize,
    /// Right column (exclusive), in chars.
    pub end_col: usize,
    /// Whether block mode is engaged.
    pub active: bool,
}

fn line_char_len(line: &str) -> usize {
    line.chars().count()
}

fn char_slice(line: &str, start_col: usize, end_col: usize) -> &str {
    let mut indices = line.char_indices().map(|(b, _)| b);
    let len = line_char_len(line);
    let start = indices.nth(start_col.min(len)).unwrap_or(line.len());
    let end = if end_col >= len {
        line.len()
    } else {
        line.char_indices()
            .map(|(b, _)| b)
            .nth(end_col)
            .unwrap_or(line.len())
    };
    &line[start.min(end)..end.max(start)]
}

fn byte_at_col(line: &str, col: usize) -> usize {
    line.char_indices()
        .map(|(b, _)| b)
        .nth(col)
        .unwrap_or(line.len())
}

impl BlockSelection {
    /// An inactive, empty block selection.
    pub fn new() -> Self {
        Self {
            start_line: 0,
            end_line: 0,
            start_col: 0,
            end_col: 0,
            active: false,
        }
    }

    /// Set and activate the rectangle, normalizing so start <= end on both
    /// axes.
    pub fn set(&mut self, start_line: usize, end_line: usize, start_col: usize, end_col: usize) {
        self.start_line = start_line.min(end_line);
        self.end_line = start_line.max(end_line);
        self.start_col = start_col.min(end_col);
        self.end_col = start_col.max(end_col);
        self.active = true;
    }

    /// Deactivate the selection.
    pub fn clear(&mut self) {
        self.active = false;
    }

    /// Grow the rectangle one line up, clamped at line 0.
    pub fn expand_up(&mut self) {
        self.start_line = self.start_line.saturating_sub(1);
    }

    /// Grow the rectangle one line down, clamped to the last line of `text`.
    pub fn expand_down(&mut self, text: &str) {
        let last = split_lines(text).len().saturating_sub(1);
        if self.end_line < last {
            self.end_line += 1;
        }
    }

    /// Grow the rectangle one column left, clamped at column 0.
    pub fn expand_left(&mut self) {
        self.start_col = self.start_col.saturating_sub(1);
    }

    /// Grow the rectangle one column right, clamped to the longest line in
    /// the selected range.
    pub fn expand_right(&mut self, text: &str) {
        let lines = split_lines(text);
        let max_len = lines
            .iter()
            .skip(self.start_line)
            .take(self.end_line - self.start_line + 1)
            .map(|l| line_char_len(l))
            .max()
            .unwrap_or(0);
        if self.end_col < max_len {
            self.end_col += 1;
        }
    }

    /// Extract the selected rectangle, one entry per line in range.
    ///
    /// Each entry is the line's `[start_col, end_col)` char span, truncated
    /// at the line's length.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lines = split_lines(text);
        lines
            .iter()
            .skip(self.start_line)
            .take(self.end_line.saturating_sub(self.start_line) + 1)
            .map(|line| char_slice(line, self.start_col, self.end_col).to_string())
            .collect()
    }

    /// Insert `insert` at `start_col` on every line in range.
    ///
    /// Lines shorter than `start_col` are padded with spaces first. Lines
    /// are rejoined with `\n`.
    pub fn insert(&self, text: &str, insert: &str) -> String {
        let lines = split_lines(text);
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if i < self.start_line || i > self.end_line {
                out.push((*line).to_string());
                continue;
            }
            let len = line_char_len(line);
            let mut new_line = (*line).to_string();
            if len < self.start_col {
                new_line.push_str(&" ".repeat(self.start_col - len));
                new_line.push_str(insert);
            } else {
                let at = byte_at_col(line, self.start_col);
                new_line.insert_str(at, insert);
            }
            out.push(new_line);
        }
        out.join("\n")
    }

    /// Delete the `[start_col, end_col)` span on every line in range.
    ///
    /// Lines shorter than `start_col` are left untouched.
    pub fn delete(&self, text: &str) -> String {
        let lines = split_lines(text);
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if i < self.start_line || i > self.end_line {
                out.push((*line).to_string());
                continue;
            }
            let len = line_char_len(line);
            if len <= self.start_col {
                out.push((*line).to_string());
                continue;
            }
            let start = byte_at_col(line, self.start_col);
            let end = byte_at_col(line, self.end_col.min(len));
            let mut new_line = (*line).to_string();
            new_line.replace_range(start..end, "");
            out.push(new_line);
        }
        out.join("\n")
    }
}

impl Default for BlockSelection {
    fn default() -> Self {
        Self::new()
    }
}
