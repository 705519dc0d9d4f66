//! The editor binding object the shell drives.
//!
//! [`Editor`] owns the tab set, per-tab cursor/block/fold state, the LSP
//! coordinator, and the syntax provider, and exposes the operations shells
//! bind to keystrokes or RPC methods. It holds no global state; embedders
//! construct one value and pass it where it is needed.
//!
//! Edits come in two modes: [`EditSource::User`] records undo history and
//! schedules LSP `didChange`; [`EditSource::Programmatic`] does neither and
//! exists for shells syncing text they obtained elsewhere.
//!
//! Anything the shell must do on the editor's behalf (open a prompt,
//! toggle a sidebar) is queued as a [`ShellIntent`] rather than invoked
//! through a callback; the shell drains the queue after each operation.

use crate::commands::Command;
use crate::syntax::{HeuristicSyntax, SyntaxProvider};
use mane_core::block::BlockSelection;
use mane_core::buffer::BufferError;
use mane_core::cursor::MultiCursor;
use mane_core::folding::FoldState;
use mane_core::search::SearchError;
use mane_core::snippet;
use mane_core::structural;
use mane_core::tabs::TabManager;
use mane_core::text::CharIndex;
use mane_lsp::client::CancelToken;
use mane_lsp::coordinator::{
    CodeAction, CompletionItem, Coordinator, Diagnostic, FileEdits, Location,
};
use mane_lsp::error::LspError;
use std::collections::VecDeque;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Errors returned to the shell. The editor never panics on these.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Filesystem or buffer-level failure.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// Language server failure.
    #[error(transparent)]
    Lsp(#[from] LspError),
    /// Invalid search pattern.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// An operation that needs an active buffer found none.
    #[error("no active buffer")]
    NoActiveBuffer,
    /// The named file is not open in any tab.
    #[error("no open buffer for {}", .0.display())]
    NotOpen(PathBuf),
    /// A synchronously checkable precondition failed.
    #[error("{0}")]
    Precondition(String),
    /// `run_command` received an id outside the closed set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Who initiated an edit, deciding undo and LSP side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    /// A person typed or pasted: record undo, schedule `didChange`.
    User,
    /// The shell is syncing text it already owns: neither.
    Programmatic,
}

/// Work the shell must perform, queued instead of called back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellIntent {
    /// Open the find prompt.
    OpenFindPrompt,
    /// Open the replace prompt.
    OpenReplacePrompt,
    /// Open the goto-line prompt.
    OpenGotoPrompt,
    /// Toggle the file sidebar.
    ToggleSidebar,
    /// Word wrap changed; re-layout.
    WordWrapChanged(bool),
}

// Per-tab interaction state, parallel to the tab list.
pub(crate) struct TabState {
    pub(crate) cursors: MultiCursor,
    pub(crate) block: BlockSelection,
    pub(crate) folds: FoldState,
}

impl TabState {
    fn new() -> Self {
        Self {
            cursors: MultiCursor::new(),
            block: BlockSelection::new(),
            folds: FoldState::new(),
        }
    }
}

/// The editing core: tabs, cursors, folding, and LSP, wired together.
pub struct Editor {
    pub(crate) tabs: TabManager,
    pub(crate) states: Vec<TabState>,
    pub(crate) coordinator: Coordinator,
    pub(crate) syntax: Box<dyn SyntaxProvider>,
    word_wrap: bool,
    find_query: Option<String>,
    find_matches: Vec<Range<usize>>,
    find_index: usize,
    intents: VecDeque<ShellIntent>,
}

impl Editor {
    /// Create an editor serving the workspace at `root`, with no open tabs.
    pub fn new(root: PathBuf) -> Self {
        Self {
            tabs: TabManager::new(),
            states: Vec::new(),
            coordinator: Coordinator::new(root),
            syntax: Box::new(HeuristicSyntax),
            word_wrap: false,
            find_query: None,
            find_matches: Vec::new(),
            find_index: 0,
            intents: VecDeque::new(),
        }
    }

    /// Replace the syntax provider (folding, symbols, syntax tree).
    pub fn with_syntax(mut self, syntax: Box<dyn SyntaxProvider>) -> Self {
        self.syntax = syntax;
        self
    }

    /// The tab set.
    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    /// Cursor set of the active tab.
    pub fn cursors(&self) -> Option<&MultiCursor> {
        Some(&self.states[self.tabs.active_index()?].cursors)
    }

    /// Block selection of the active tab.
    pub fn block(&self) -> Option<&BlockSelection> {
        Some(&self.states[self.tabs.active_index()?].block)
    }

    /// Fold state of the active tab.
    pub fn folds(&self) -> Option<&FoldState> {
        Some(&self.states[self.tabs.active_index()?].folds)
    }

    /// Whether word wrap is on. Rendering is the shell's concern.
    pub fn word_wrap(&self) -> bool {
        self.word_wrap
    }

    /// Queued shell work, oldest first.
    pub fn drain_intents(&mut self) -> Vec<ShellIntent> {
        self.intents.drain(..).collect()
    }

    /// Drive time-based work: debounced `didChange` flushes and incoming
    /// LSP notifications. Call from the shell's event loop.
    pub fn pump(&mut self, now: Instant) {
        self.coordinator.pump(now);
    }

    // ----- tabs -----

    /// Open a new untitled tab and activate it.
    pub fn new_untitled(&mut self) -> usize {
        let index = self.tabs.new_untitled();
        self.states.push(TabState::new());
        self.on_tab_activated();
        index
    }

    /// Open `path` (or activate its existing tab) and announce it to its
    /// language server.
    pub fn open_file(&mut self, path: &Path) -> Result<usize, EditorError> {
        let before = self.tabs.len();
        let index = self.tabs.open_file(path)?;
        let newly_opened = self.tabs.len() > before;
        if newly_opened {
            self.states.push(TabState::new());
        }
        self.on_tab_activated();
        if newly_opened
            && let Some(buffer) = self.tabs.buffer(index)
        {
            let (path, text) = (buffer.path().to_path_buf(), buffer.text().to_string());
            self.coordinator.open(&path, &text);
        }
        Ok(index)
    }

    /// Save the buffer holding `path` and announce the save.
    pub fn save_file(&mut self, path: &Path) -> Result<(), EditorError> {
        let index = self
            .tabs
            .index_of_path(path)
            .ok_or_else(|| EditorError::NotOpen(path.to_path_buf()))?;
        self.save_index(index)
    }

    /// Save the active buffer. Fails on untitled buffers.
    pub fn save_active(&mut self) -> Result<(), EditorError> {
        let index = self.active()?;
        self.save_index(index)
    }

    fn save_index(&mut self, index: usize) -> Result<(), EditorError> {
        let buffer = self.tabs.buffer_mut(index).ok_or(EditorError::NoActiveBuffer)?;
        buffer.save()?;
        let path = buffer.path().to_path_buf();
        self.coordinator.save(&path);
        Ok(())
    }

    /// Close tab `index`: `didClose`, drop its state, fix the active tab.
    pub fn close_tab(&mut self, index: usize) {
        if index >= self.tabs.len() {
            return;
        }
        if let Some(buffer) = self.tabs.buffer(index)
            && !buffer.is_untitled()
        {
            let path = buffer.path().to_path_buf();
            self.coordinator.close(&path);
        }
        self.tabs.close(index);
        self.states.remove(index);
        self.clear_find();
        self.on_tab_activated();
    }

    /// Activate tab `index`. Out-of-range indices are a no-op.
    pub fn switch_tab(&mut self, index: usize) {
        if index >= self.tabs.len() {
            return;
        }
        self.tabs.set_active(index);
        self.clear_find();
        self.on_tab_activated();
    }

    // Entering a tab collapses multi-cursor and block state and re-derives
    // fold regions for its current text.
    fn on_tab_activated(&mut self) {
        let Some(index) = self.tabs.active_index() else {
            return;
        };
        let text = self
            .tabs
            .buffer(index)
            .map(|b| b.text().to_string())
            .unwrap_or_default();
        let regions = self.syntax.fold_regions(&text);
        let state = &mut self.states[index];
        state.cursors.reset();
        state.cursors.clamp(text.chars().count());
        state.block.clear();
        state.folds.update_regions(regions);
    }

    // ----- editing -----

    /// Replace every cursor's selection with `text` (multi-cursor aware).
    pub fn apply_paste(&mut self, text: &str) -> Result<(), EditorError> {
        let index = self.active()?;
        self.states[index].block.clear();
        self.user_edit(index, |state, old| state.cursors.insert_at_all(old, text))
    }

    /// Insert a single typed grapheme; same dispatch as paste.
    pub fn insert_text(&mut self, text: &str) -> Result<(), EditorError> {
        self.apply_paste(text)
    }

    /// Backspace: block-delete when block mode is on, else per cursor.
    pub fn delete_backspace(&mut self) -> Result<(), EditorError> {
        let index = self.active()?;
        if self.states[index].block.active {
            return self.user_edit(index, |state, old| {
                let new_text = state.block.delete(old);
                state.block.end_col = state.block.start_col;
                new_text
            });
        }
        self.user_edit(index, |state, old| state.cursors.delete_backspace(old))
    }

    /// Forward delete: block-delete when block mode is on, else per cursor.
    pub fn delete_forward(&mut self) -> Result<(), EditorError> {
        let index = self.active()?;
        if self.states[index].block.active {
            return self.user_edit(index, |state, old| {
                let new_text = state.block.delete(old);
                state.block.end_col = state.block.start_col;
                new_text
            });
        }
        self.user_edit(index, |state, old| state.cursors.delete_forward(old))
    }

    /// Undo the last edit on the active buffer.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let index = self.active()?;
        let buffer = self.tabs.buffer_mut(index).ok_or(EditorError::NoActiveBuffer)?;
        let undone = buffer.undo();
        if undone {
            self.after_edit(index, EditSource::User);
        }
        Ok(undone)
    }

    /// Redo the last undone edit on the active buffer.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let index = self.active()?;
        let buffer = self.tabs.buffer_mut(index).ok_or(EditorError::NoActiveBuffer)?;
        let redone = buffer.redo();
        if redone {
            self.after_edit(index, EditSource::User);
        }
        Ok(redone)
    }

    // ----- selection -----

    /// Set the primary selection (chars), leaving multi-cursor state alone.
    pub fn set_selection(&mut self, start: usize, end: usize) -> Result<(), EditorError> {
        let index = self.active()?;
        self.states[index].block.clear();
        self.states[index].cursors.set_primary(end, start);
        Ok(())
    }

    /// Add a secondary selection; leaves block mode.
    pub fn add_selection(&mut self, start: usize, end: usize) -> Result<(), EditorError> {
        let index = self.active()?;
        self.states[index].block.clear();
        self.states[index].cursors.add_selection(start, end);
        Ok(())
    }

    /// Add a secondary caret; leaves block mode.
    pub fn add_cursor(&mut self, offset: usize) -> Result<(), EditorError> {
        let index = self.active()?;
        self.states[index].block.clear();
        self.states[index].cursors.add_cursor(offset);
        Ok(())
    }

    /// Char position of the bracket matching the one under the primary
    /// caret. `None` when the caret is not on a bracket or no partner
    /// exists.
    pub fn matching_bracket_at_cursor(&self) -> Option<usize> {
        let index = self.tabs.active_index()?;
        let buffer = self.tabs.buffer(index)?;
        let offset = self.states[index].cursors.primary().offset;
        structural::find_matching_bracket(buffer.text(), offset)
    }

    /// Select the next occurrence of the current selection's text.
    pub fn add_next_occurrence(&mut self) -> Result<bool, EditorError> {
        let index = self.active()?;
        let text = self
            .tabs
            .buffer(index)
            .map(|b| b.text().to_string())
            .unwrap_or_default();
        Ok(self.states[index].cursors.add_next_occurrence(&text))
    }

    /// Engage block mode over a rectangle; collapses multi-cursor state.
    pub fn set_block(
        &mut self,
        start_line: usize,
        end_line: usize,
        start_col: usize,
        end_col: usize,
    ) -> Result<(), EditorError> {
        let index = self.active()?;
        let state = &mut self.states[index];
        state.cursors.reset();
        state.block.set(start_line, end_line, start_col, end_col);
        Ok(())
    }

    /// Insert `text` at the block's left column on every selected line.
    pub fn block_insert(&mut self, text: &str) -> Result<(), EditorError> {
        let index = self.active()?;
        if !self.states[index].block.active {
            return Err(EditorError::Precondition("block mode is not active".into()));
        }
        self.user_edit(index, |state, old| state.block.insert(old, text))
    }

    /// Grow the block selection one line up.
    pub fn expand_block_up(&mut self) -> Result<(), EditorError> {
        self.with_active_block(|block, _| block.expand_up())
    }

    /// Grow the block selection one line down.
    pub fn expand_block_down(&mut self) -> Result<(), EditorError> {
        self.with_active_block(|block, text| block.expand_down(text))
    }

    /// Grow the block selection one column left.
    pub fn expand_block_left(&mut self) -> Result<(), EditorError> {
        self.with_active_block(|block, _| block.expand_left())
    }

    /// Grow the block selection one column right.
    pub fn expand_block_right(&mut self) -> Result<(), EditorError> {
        self.with_active_block(|block, text| block.expand_right(text))
    }

    fn with_active_block(
        &mut self,
        f: impl FnOnce(&mut BlockSelection, &str),
    ) -> Result<(), EditorError> {
        let index = self.active()?;
        if !self.states[index].block.active {
            return Err(EditorError::Precondition("block mode is not active".into()));
        }
        let text = self
            .tabs
            .buffer(index)
            .ok_or(EditorError::NoActiveBuffer)?
            .text()
            .to_string();
        f(&mut self.states[index].block, &text);
        Ok(())
    }

    /// The block's selected text, one string per line.
    pub fn block_extract(&self) -> Result<Vec<String>, EditorError> {
        let index = self.active()?;
        let state = &self.states[index];
        if !state.block.active {
            return Err(EditorError::Precondition("block mode is not active".into()));
        }
        let buffer = self.tabs.buffer(index).ok_or(EditorError::NoActiveBuffer)?;
        Ok(state.block.extract(buffer.text()))
    }

    // ----- find / replace -----

    /// Find `query` in the active buffer; selects the first match and
    /// remembers the match list. Returns the number of matches.
    pub fn find(&mut self, query: &str) -> Result<usize, EditorError> {
        let index = self.active()?;
        let buffer = self.tabs.buffer(index).ok_or(EditorError::NoActiveBuffer)?;
        let matches = buffer.find(query);
        let count = matches.len();
        if let Some(first) = matches.first() {
            let char_index = CharIndex::new(buffer.text());
            let (start, end) = (
                char_index.byte_to_char(first.start),
                char_index.byte_to_char(first.end),
            );
            let state = &mut self.states[index];
            state.cursors.reset();
            state.cursors.set_primary(end, start);
        }
        self.find_query = Some(query.to_string());
        self.find_matches = matches;
        self.find_index = 0;
        Ok(count)
    }

    /// Replace the current match, keeping the match list fresh. Returns
    /// whether a match was replaced.
    pub fn replace_current(&mut self, replacement: &str) -> Result<bool, EditorError> {
        let index = self.active()?;
        let Some(range) = self.find_matches.get(self.find_index).cloned() else {
            return Ok(false);
        };
        let query = self.find_query.clone().unwrap_or_default();
        let buffer = self.tabs.buffer_mut(index).ok_or(EditorError::NoActiveBuffer)?;
        buffer.replace(range, replacement);
        self.after_edit(index, EditSource::User);

        // after_edit dropped the find state; recompute from the same query.
        if let Some(buffer) = self.tabs.buffer(index) {
            self.find_matches = buffer.find(&query);
            self.find_index = self.find_index.min(self.find_matches.len().saturating_sub(1));
            self.find_query = Some(query);
        }
        Ok(true)
    }

    /// Replace every occurrence of `query` in the active buffer. One undo
    /// step per occurrence; returns the replacement count.
    pub fn replace_all(&mut self, query: &str, replacement: &str) -> Result<usize, EditorError> {
        let index = self.active()?;
        let buffer = self.tabs.buffer_mut(index).ok_or(EditorError::NoActiveBuffer)?;
        let count = buffer.replace_all(query, replacement);
        if count > 0 {
            self.after_edit(index, EditSource::User);
        }
        Ok(count)
    }

    /// Jump to 1-based line `n`: unfold whatever hides it and put the caret
    /// at column 0.
    pub fn goto_line(&mut self, n: usize) -> Result<(), EditorError> {
        if n == 0 {
            return Err(EditorError::Precondition("line numbers are 1-based".into()));
        }
        let index = self.active()?;
        let buffer = self.tabs.buffer(index).ok_or(EditorError::NoActiveBuffer)?;
        let line_index = buffer.line_index();
        let line = (n - 1).min(line_index.line_count().saturating_sub(1));
        let offset = line_index.line_to_char(line);
        let state = &mut self.states[index];
        state.folds.unfold_containing(line);
        state.cursors.reset();
        state.cursors.set_primary(offset, offset);
        Ok(())
    }

    // ----- folding -----

    /// Fold the region at the primary cursor's line.
    pub fn fold_at_cursor(&mut self) -> bool {
        self.with_cursor_line(|state, line| state.folds.fold_at(line))
    }

    /// Unfold the region at the primary cursor's line.
    pub fn unfold_at_cursor(&mut self) -> bool {
        self.with_cursor_line(|state, line| state.folds.unfold_at(line))
    }

    /// Fold every region in the active tab.
    pub fn fold_all(&mut self) {
        self.with_cursor_line(|state, _| {
            state.folds.fold_all();
            true
        });
    }

    /// Unfold every region in the active tab.
    pub fn unfold_all(&mut self) {
        self.with_cursor_line(|state, _| {
            state.folds.unfold_all();
            true
        });
    }

    fn with_cursor_line(&mut self, f: impl FnOnce(&mut TabState, usize) -> bool) -> bool {
        let Some(index) = self.tabs.active_index() else {
            return false;
        };
        let Some(buffer) = self.tabs.buffer(index) else {
            return false;
        };
        let offset = self.states[index].cursors.primary().offset;
        let (line, _) = buffer.line_index().char_to_position(offset);
        f(&mut self.states[index], line)
    }

    // ----- LSP -----

    /// Completions at the primary cursor.
    pub fn lsp_completion(
        &mut self,
        cancel: &CancelToken,
    ) -> Result<Vec<CompletionItem>, EditorError> {
        let (path, line, col) = self.lsp_target()?;
        Ok(self.coordinator.completion(&path, line, col, cancel)?)
    }

    /// Hover text at the primary cursor.
    pub fn lsp_hover(&mut self, cancel: &CancelToken) -> Result<Option<String>, EditorError> {
        let (path, line, col) = self.lsp_target()?;
        Ok(self.coordinator.hover(&path, line, col, cancel)?)
    }

    /// Definition of the symbol at the primary cursor.
    pub fn lsp_definition(&mut self, cancel: &CancelToken) -> Result<Vec<Location>, EditorError> {
        let (path, line, col) = self.lsp_target()?;
        Ok(self.coordinator.definition(&path, line, col, cancel)?)
    }

    /// References to the symbol at the primary cursor.
    pub fn lsp_references(&mut self, cancel: &CancelToken) -> Result<Vec<Location>, EditorError> {
        let (path, line, col) = self.lsp_target()?;
        Ok(self.coordinator.references(&path, line, col, cancel)?)
    }

    /// Rename the symbol at the primary cursor. The shell applies the
    /// returned edits (possibly across files) and reports back.
    pub fn lsp_rename(
        &mut self,
        new_name: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<FileEdits>, EditorError> {
        let (path, line, col) = self.lsp_target()?;
        Ok(self.coordinator.rename(&path, line, col, new_name, cancel)?)
    }

    /// Code actions for the primary selection.
    pub fn lsp_code_action(
        &mut self,
        cancel: &CancelToken,
    ) -> Result<Vec<CodeAction>, EditorError> {
        let index = self.active()?;
        let buffer = self.tabs.buffer(index).ok_or(EditorError::NoActiveBuffer)?;
        if buffer.is_untitled() {
            return Err(EditorError::Precondition("buffer has no file".into()));
        }
        let path = buffer.path().to_path_buf();
        let line_index = buffer.line_index();
        let (sel_start, sel_end) = self.states[index].cursors.primary().range();
        let start = line_index.char_to_position(sel_start);
        let end = line_index.char_to_position(sel_end);
        Ok(self.coordinator.code_actions(&path, start, end, cancel)?)
    }

    /// Published diagnostics for `path`.
    pub fn diagnostics(&self, path: &Path) -> &[Diagnostic] {
        self.coordinator.diagnostics(path)
    }

    /// Insert a completion at the primary cursor, expanding snippets and
    /// placing the caret where the snippet asks.
    pub fn apply_lsp_completion(&mut self, item: &CompletionItem) -> Result<(), EditorError> {
        let index = self.active()?;
        let (insert, cursor_chars) = if item.is_snippet {
            let expanded = snippet::expand(&item.insert_text);
            let cursor = expanded.cursor;
            (expanded.text, cursor)
        } else {
            let chars = item.insert_text.chars().count();
            (item.insert_text.clone(), chars)
        };

        self.user_edit(index, |state, old| {
            let (sel_start, sel_end) = state.cursors.primary().range();
            let char_index = CharIndex::new(old);
            let (start_byte, end_byte) = (
                char_index.char_to_byte(sel_start),
                char_index.char_to_byte(sel_end),
            );
            let mut new_text = String::with_capacity(old.len() + insert.len());
            new_text.push_str(&old[..start_byte]);
            new_text.push_str(&insert);
            new_text.push_str(&old[end_byte..]);

            let caret = sel_start + cursor_chars;
            state.cursors.reset();
            state.cursors.set_primary(caret, caret);
            new_text
        })
    }

    // ----- commands / misc -----

    /// Flip word wrap and tell the shell to re-layout.
    pub fn toggle_word_wrap(&mut self) {
        self.word_wrap = !self.word_wrap;
        self.intents.push_back(ShellIntent::WordWrapChanged(self.word_wrap));
    }

    /// Run a command by id from the closed set. Unknown ids fail.
    pub fn run_command(&mut self, id: &str) -> Result<(), EditorError> {
        let command =
            Command::parse(id).ok_or_else(|| EditorError::UnknownCommand(id.to_string()))?;
        match command {
            Command::Save => self.save_active()?,
            Command::New => {
                self.new_untitled();
            }
            Command::Close => {
                if let Some(index) = self.tabs.active_index() {
                    self.close_tab(index);
                }
            }
            Command::Undo => {
                self.undo()?;
            }
            Command::Redo => {
                self.redo()?;
            }
            Command::Find => self.intents.push_back(ShellIntent::OpenFindPrompt),
            Command::Replace => self.intents.push_back(ShellIntent::OpenReplacePrompt),
            Command::Goto => self.intents.push_back(ShellIntent::OpenGotoPrompt),
            Command::Fold => {
                self.fold_at_cursor();
            }
            Command::Unfold => {
                self.unfold_at_cursor();
            }
            Command::FoldAll => self.fold_all(),
            Command::UnfoldAll => self.unfold_all(),
            Command::ToggleSidebar => self.intents.push_back(ShellIntent::ToggleSidebar),
            Command::ToggleWrap => self.toggle_word_wrap(),
        }
        Ok(())
    }

    /// Shut down every language server. Call before exit.
    pub fn shutdown(&mut self) {
        self.coordinator.shutdown();
    }

    // ----- internals -----

    pub(crate) fn active(&self) -> Result<usize, EditorError> {
        self.tabs.active_index().ok_or(EditorError::NoActiveBuffer)
    }

    // Run `f` against tab `index`'s state and current text; the returned
    // text becomes the buffer content as a user edit.
    pub(crate) fn user_edit(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut TabState, &str) -> String,
    ) -> Result<(), EditorError> {
        let old = self
            .tabs
            .buffer(index)
            .ok_or(EditorError::NoActiveBuffer)?
            .text()
            .to_string();
        let new_text = f(&mut self.states[index], &old);
        let buffer = self.tabs.buffer_mut(index).ok_or(EditorError::NoActiveBuffer)?;
        buffer.replace_text_diff(&new_text);
        self.after_edit(index, EditSource::User);
        Ok(())
    }

    // Re-establish derived state after the text of tab `index` changed.
    pub(crate) fn after_edit(&mut self, index: usize, source: EditSource) {
        let Some(buffer) = self.tabs.buffer(index) else {
            return;
        };
        let text = buffer.text().to_string();
        let path = buffer.path().to_path_buf();
        let untitled = buffer.is_untitled();

        let regions = self.syntax.fold_regions(&text);
        let state = &mut self.states[index];
        state.cursors.clamp(text.chars().count());
        state.folds.update_regions(regions);
        self.clear_find();

        if source == EditSource::User && !untitled {
            self.coordinator.change(&path, &text, Instant::now());
        }
    }

    fn clear_find(&mut self) {
        self.find_query = None;
        self.find_matches.clear();
        self.find_index = 0;
    }

    fn lsp_target(&self) -> Result<(PathBuf, usize, usize), EditorError> {
        let index = self.active()?;
        let buffer = self.tabs.buffer(index).ok_or(EditorError::NoActiveBuffer)?;
        if buffer.is_untitled() {
            return Err(EditorError::Precondition("buffer has no file".into()));
        }
        let offset = self.states[index].cursors.primary().offset;
        let (line, col) = buffer.line_index().char_to_position(offset);
        Ok((buffer.path().to_path_buf(), line, col))
    }
}
