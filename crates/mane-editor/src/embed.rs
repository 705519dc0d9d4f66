//! Embedding contract for shells and automation.
//!
//! These are the read / mutate / introspect operations exposed to
//! terminal widgets, web RPC layers, and scripting hosts. Coordinates
//! follow the contract: `get_cursor_position` and `goto_line` are 1-based,
//! `apply_edit` and search results are 0-based.

use crate::editor::{EditSource, Editor, EditorError};
use crate::project::{self, FileMatch};
use crate::syntax::Symbol;
use mane_core::text::CharIndex;
use mane_lsp::coordinator::Diagnostic;
use std::path::{Path, PathBuf};

/// One match from an active-buffer search, 0-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Line of the match (0-based).
    pub line: usize,
    /// Column in chars.
    pub col: usize,
    /// The matched text.
    pub text: String,
    /// The full line containing the match.
    pub context: String,
}

impl Editor {
    /// Path of the active buffer; `None` when no tab is open or the active
    /// buffer is untitled.
    pub fn active_file(&self) -> Option<PathBuf> {
        let buffer = self.tabs.active_buffer()?;
        if buffer.is_untitled() {
            None
        } else {
            Some(buffer.path().to_path_buf())
        }
    }

    /// Paths of every open file, in tab order; untitled tabs are skipped.
    pub fn list_open_files(&self) -> Vec<PathBuf> {
        self.tabs
            .buffers()
            .iter()
            .filter(|b| !b.is_untitled())
            .map(|b| b.path().to_path_buf())
            .collect()
    }

    /// The workspace root.
    pub fn project_root(&self) -> &Path {
        self.coordinator.root()
    }

    /// Current text of the open buffer holding `path`.
    pub fn read_buffer(&self, path: &Path) -> Result<String, EditorError> {
        let index = self
            .tabs
            .index_of_path(path)
            .ok_or_else(|| EditorError::NotOpen(path.to_path_buf()))?;
        Ok(self
            .tabs
            .buffer(index)
            .map(|b| b.text().to_string())
            .unwrap_or_default())
    }

    /// Primary caret position in the active buffer, 1-based (line, col).
    pub fn get_cursor_position(&self) -> Option<(usize, usize)> {
        let index = self.tabs.active_index()?;
        let buffer = self.tabs.buffer(index)?;
        let offset = self.states[index].cursors.primary().offset;
        let (line, col) = buffer.line_index().char_to_position(offset);
        Some((line + 1, col + 1))
    }

    /// Replace the whole text of the buffer holding `path` without
    /// recording undo or notifying the language server.
    ///
    /// This is the programmatic sync path for shells that already own the
    /// text; user-visible edits go through the editing operations instead.
    pub fn write_buffer(&mut self, path: &Path, text: &str) -> Result<(), EditorError> {
        let index = self
            .tabs
            .index_of_path(path)
            .ok_or_else(|| EditorError::NotOpen(path.to_path_buf()))?;
        let buffer = self
            .tabs
            .buffer_mut(index)
            .ok_or_else(|| EditorError::NotOpen(path.to_path_buf()))?;
        buffer.set_text(text.to_string());
        self.after_edit(index, EditSource::Programmatic);
        Ok(())
    }

    /// Replace a 0-based (line, col) span in the buffer holding `path`.
    ///
    /// A user-mode edit: it records undo history and schedules `didChange`.
    pub fn apply_edit(
        &mut self,
        path: &Path,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
        new_text: &str,
    ) -> Result<(), EditorError> {
        let index = self
            .tabs
            .index_of_path(path)
            .ok_or_else(|| EditorError::NotOpen(path.to_path_buf()))?;
        let buffer = self
            .tabs
            .buffer_mut(index)
            .ok_or_else(|| EditorError::NotOpen(path.to_path_buf()))?;

        let line_index = buffer.line_index();
        let start = line_index.position_to_char(start_line, start_col);
        let end = line_index.position_to_char(end_line, end_col).max(start);

        let old = buffer.text();
        let char_index = CharIndex::new(old);
        let (start_byte, end_byte) = (char_index.char_to_byte(start), char_index.char_to_byte(end));
        let mut text = String::with_capacity(old.len() + new_text.len());
        text.push_str(&old[..start_byte]);
        text.push_str(new_text);
        text.push_str(&old[end_byte..]);

        buffer.replace_text_diff(&text);
        self.after_edit(index, EditSource::User);
        Ok(())
    }

    /// Search the active buffer for `query` (literal, case-sensitive).
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, EditorError> {
        let index = self.active()?;
        let buffer = self.tabs.buffer(index).ok_or(EditorError::NoActiveBuffer)?;
        let text = buffer.text();
        let line_index = buffer.line_index();
        let char_index = CharIndex::new(text);

        Ok(buffer
            .find(query)
            .into_iter()
            .map(|range| {
                let start_char = char_index.byte_to_char(range.start);
                let (line, col) = line_index.char_to_position(start_char);
                SearchHit {
                    line,
                    col,
                    text: text[range].to_string(),
                    context: line_index.line_text(line).unwrap_or_default(),
                }
            })
            .collect())
    }

    /// Search every project file for `query`.
    pub fn search_files(&self, query: &str) -> Result<Vec<FileMatch>, EditorError> {
        Ok(project::search_files(query, self.project_root())?)
    }

    /// Project files under the workspace root, ignore-aware.
    pub fn list_project_files(&self) -> Vec<PathBuf> {
        project::list(self.project_root())
    }

    /// Published diagnostics for `path`.
    pub fn get_diagnostics(&self, path: &Path) -> Vec<Diagnostic> {
        self.diagnostics(path).to_vec()
    }

    /// Outline symbols for the open buffer holding `path`.
    pub fn get_symbols(&self, path: &Path) -> Result<Vec<Symbol>, EditorError> {
        let text = self.read_buffer(path)?;
        Ok(self.syntax.symbols(&text))
    }

    /// Debug s-expression of the structure of the buffer holding `path`.
    pub fn get_syntax_tree(&self, path: &Path) -> Result<String, EditorError> {
        let text = self.read_buffer(path)?;
        Ok(self.syntax.syntax_tree(&text))
    }
}
