//! One open document: text, saved-text marker, and a reversible edit log.
//!
//! A [`Buffer`] owns the current text, the text as of the last load/save
//! (dirty = the two differ), and undo/redo logs of [`EditRecord`]s. Edit
//! offsets are **bytes**; an edit replaces `old_text` at `offset` with
//! `new_text` and is undone by applying the reverse replacement.

use crate::line_index::LineIndex;
use crate::search::{self, SearchOptions};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Buffer errors. Only filesystem-facing operations can fail.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// Filesystem read/write failure, surfaced verbatim.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// `save` was called on a buffer without a file path.
    #[error("buffer is untitled; use save_as")]
    Untitled,
}

/// One reversible edit: `old_text` at byte `offset` became `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    /// Byte offset of the replaced span.
    pub offset: usize,
    /// Exact text that was replaced.
    pub old_text: String,
    /// Text it was replaced with.
    pub new_text: String,
}

/// One open document's editable state.
pub struct Buffer {
    path: PathBuf,
    text: String,
    saved_text: String,
    undo_log: Vec<EditRecord>,
    redo_log: Vec<EditRecord>,
}

impl Buffer {
    /// Create an empty untitled buffer.
    pub fn new() -> Self {
        Self {
            path: PathBuf::new(),
            text: String::new(),
            saved_text: String::new(),
            undo_log: Vec::new(),
            redo_log: Vec::new(),
        }
    }

    /// Load a buffer from a file, clearing both edit logs.
    ///
    /// The stored path is the absolute (canonicalized) form.
    pub fn open(path: &Path) -> Result<Self, BufferError> {
        let abs = fs::canonicalize(path)?;
        let text = fs::read_to_string(&abs)?;
        Ok(Self {
            path: abs,
            saved_text: text.clone(),
            text,
            undo_log: Vec::new(),
            redo_log: Vec::new(),
        })
    }

    /// Current text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Absolute file path; empty for untitled buffers.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this buffer has no backing file.
    pub fn is_untitled(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Whether the text differs from the last loaded/saved content.
    pub fn dirty(&self) -> bool {
        self.text != self.saved_text
    }

    /// Display title: the path's final component, or `untitled`.
    pub fn title(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }

    /// Build a line index for the current text.
    pub fn line_index(&self) -> LineIndex {
        LineIndex::from_text(&self.text)
    }

    /// Write the text to the buffer's path and mark it clean.
    pub fn save(&mut self) -> Result<(), BufferError> {
        if self.is_untitled() {
            return Err(BufferError::Untitled);
        }
        fs::write(&self.path, &self.text)?;
        self.saved_text = self.text.clone();
        Ok(())
    }

    /// Write the text to a new path, adopt that path, and mark clean.
    pub fn save_as(&mut self, path: &Path) -> Result<(), BufferError> {
        fs::write(path, &self.text)?;
        self.path = fs::canonicalize(path)?;
        self.saved_text = self.text.clone();
        Ok(())
    }

    /// Replace the content without recording an edit.
    ///
    /// Used by coarse external operations (programmatic sync); callers that
    /// want undo should go through [`Buffer::apply_edit`] or
    /// [`Buffer::replace_text_diff`].
    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Replace bytes `[offset, offset + old_text.len())` with `new_text`,
    /// push the record onto the undo log, and clear the redo log.
    pub fn apply_edit(&mut self, offset: usize, old_text: &str, new_text: &str) {
        debug_assert_eq!(
            self.text.get(offset..offset + old_text.len()),
            Some(old_text),
            "edit record does not match buffer content",
        );
        self.text
            .replace_range(offset..offset + old_text.len(), new_text);
        self.undo_log.push(EditRecord {
            offset,
            old_text: old_text.to_string(),
            new_text: new_text.to_string(),
        });
        self.redo_log.clear();
    }

    /// Record the transition from the current text to `new_text` as a single
    /// minimal edit (common prefix and suffix trimmed).
    ///
    /// Coarse operations (multi-cursor edits, block edits) use this so they
    /// undo as one step.
    pub fn replace_text_diff(&mut self, new_text: &str) {
        if self.text == new_text {
            return;
        }

        let old = self.text.as_bytes();
        let new = new_text.as_bytes();

        let mut prefix = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();
        // Back off to a char boundary.
        while !self.text.is_char_boundary(prefix) {
            prefix -= 1;
        }

        let mut suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        while !self.text.is_char_boundary(old.len() - suffix)
            || !new_text.is_char_boundary(new.len() - suffix)
        {
            suffix -= 1;
        }

        let old_span = self.text[prefix..old.len() - suffix].to_string();
        let new_span = new_text[prefix..new.len() - suffix].to_string();
        self.apply_edit(prefix, &old_span, &new_span);
    }

    /// Undo the most recent edit. Returns `false` if the undo log is empty.
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_log.pop() else {
            return false;
        };
        self.text.replace_range(
            record.offset..record.offset + record.new_text.len(),
            &record.old_text,
        );
        self.redo_log.push(record);
        true
    }

    /// Redo the most recently undone edit. Returns `false` if the redo log
    /// is empty.
    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_log.pop() else {
            return false;
        };
        self.text.replace_range(
            record.offset..record.offset + record.old_text.len(),
            &record.new_text,
        );
        self.undo_log.push(record);
        true
    }

    /// Undo log depth.
    pub fn undo_depth(&self) -> usize {
        self.undo_log.len()
    }

    /// Redo log depth.
    pub fn redo_depth(&self) -> usize {
        self.redo_log.len()
    }

    /// Find all non-overlapping byte ranges where `query` occurs, scanning
    /// left-to-right. An empty query returns no matches.
    pub fn find(&self, query: &str) -> Vec<Range<usize>> {
        search::find_all(&self.text, query, SearchOptions::default()).unwrap_or_default()
    }

    /// Find with explicit [`SearchOptions`].
    pub fn find_with_options(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<Range<usize>>, crate::search::SearchError> {
        search::find_all(&self.text, query, options)
    }

    /// Replace a byte range with `replacement`, recording one edit.
    pub fn replace(&mut self, range: Range<usize>, replacement: &str) {
        let old = self.text[range.clone()].to_string();
        self.apply_edit(range.start, &old, replacement);
    }

    /// Replace every occurrence of `query` with `replacement`.
    ///
    /// Replacements are applied in reverse order so earlier offsets stay
    /// valid; each replacement is its own undo record. Returns the count.
    pub fn replace_all(&mut self, query: &str, replacement: &str) -> usize {
        let matches = self.find(query);
        for range in matches.iter().rev() {
            self.replace(range.clone(), replacement);
        }
        matches.len()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_untitled_defaults() {
        let buffer = Buffer::new();
        assert!(buffer.is_untitled());
        assert!(!buffer.dirty());
        assert_eq!(buffer.title(), "untitled");
    }

    #[test]
    fn test_apply_edit_and_dirty() {
        let mut buffer = Buffer::new();
        buffer.apply_edit(0, "", "hello");
        assert_eq!(buffer.text(), "hello");
        assert!(buffer.dirty());
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut buffer = Buffer::new();
        buffer.apply_edit(0, "", "hello");
        buffer.apply_edit(5, "", " world");
        assert_eq!(buffer.text(), "hello world");

        assert!(buffer.undo());
        assert_eq!(buffer.text(), "hello");
        assert!(buffer.undo());
        assert_eq!(buffer.text(), "");
        assert!(!buffer.undo());

        assert!(buffer.redo());
        assert!(buffer.redo());
        assert_eq!(buffer.text(), "hello world");
        assert!(!buffer.redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut buffer = Buffer::new();
        buffer.apply_edit(0, "", "ab");
        buffer.undo();
        buffer.apply_edit(0, "", "xy");
        assert!(!buffer.redo());
        assert_eq!(buffer.text(), "xy");
    }

    #[test]
    fn test_find_returns_byte_ranges() {
        let mut buffer = Buffer::new();
        buffer.set_text("foo bar foo".to_string());
        assert_eq!(buffer.find("foo"), vec![0..3, 8..11]);
        assert!(buffer.find("").is_empty());
    }

    #[test]
    fn test_replace_all_reverse_order_and_undo() {
        let mut buffer = Buffer::new();
        buffer.set_text("aa bb aa".to_string());

        let count = buffer.replace_all("aa", "cc");
        assert_eq!(count, 2);
        assert_eq!(buffer.text(), "cc bb cc");

        assert!(buffer.undo());
        assert!(buffer.undo());
        assert_eq!(buffer.text(), "aa bb aa");
    }

    #[test]
    fn test_replace_all_shrinking_replacement() {
        let mut buffer = Buffer::new();
        buffer.set_text("xx yy xx yy".to_string());
        assert_eq!(buffer.replace_all("yy", "z"), 2);
        assert_eq!(buffer.text(), "xx z xx z");
    }

    #[test]
    fn test_replace_text_diff_minimal_record() {
        let mut buffer = Buffer::new();
        buffer.set_text("foo bar baz".to_string());
        buffer.replace_text_diff("foo QUX baz");
        assert_eq!(buffer.text(), "foo QUX baz");

        assert!(buffer.undo());
        assert_eq!(buffer.text(), "foo bar baz");
        assert!(buffer.redo());
        assert_eq!(buffer.text(), "foo QUX baz");
    }

    #[test]
    fn test_replace_text_diff_multibyte_boundary() {
        let mut buffer = Buffer::new();
        buffer.set_text("你好".to_string());
        buffer.replace_text_diff("你们");
        assert_eq!(buffer.text(), "你们");
        buffer.undo();
        assert_eq!(buffer.text(), "你好");
    }

    #[test]
    fn test_set_text_records_nothing() {
        let mut buffer = Buffer::new();
        buffer.set_text("abc".to_string());
        assert!(!buffer.undo());
        assert!(buffer.dirty());
    }

    #[test]
    fn test_save_untitled_fails() {
        let mut buffer = Buffer::new();
        assert!(matches!(buffer.save(), Err(BufferError::Untitled)));
    }

    #[test]
    fn test_open_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        fs::write(&path, "first").unwrap();

        let mut buffer = Buffer::open(&path).unwrap();
        assert_eq!(buffer.text(), "first");
        assert!(!buffer.dirty());
        assert_eq!(buffer.title(), "doc.txt");

        buffer.apply_edit(0, "first", "second");
        assert!(buffer.dirty());

        buffer.save().unwrap();
        assert!(!buffer.dirty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_save_as_adopts_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");

        let mut buffer = Buffer::new();
        buffer.set_text("content".to_string());
        buffer.save_as(&path).unwrap();

        assert!(!buffer.is_untitled());
        assert!(!buffer.dirty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        assert!(matches!(
            Buffer::open(Path::new("/nonexistent/mane-test-file")),
            Err(BufferError::Io(_))
        ));
    }

    #[test]
    fn test_undo_redo_symmetry_property() {
        let mut buffer = Buffer::new();
        buffer.apply_edit(0, "", "abc");
        buffer.apply_edit(3, "", "def");
        buffer.apply_edit(0, "abc", "x");
        let final_text = buffer.text().to_string();
        let depth = buffer.undo_depth();

        for _ in 0..depth {
            assert!(buffer.undo());
        }
        for _ in 0..depth {
            assert!(buffer.redo());
        }
        assert_eq!(buffer.text(), final_text);
        assert_eq!(buffer.undo_depth(), depth);
        assert_eq!(buffer.redo_depth(), 0);
    }
}
