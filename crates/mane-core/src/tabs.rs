//! Tab manager: the ordered collection of open buffers.
//!
//! Holds a `Vec<Buffer>` plus the active index. Opening a path that matches
//! an existing buffer's absolute path activates that buffer instead of
//! duplicating it. The tab manager has no edit or LSP side effects; that
//! coordination lives in the editor binding layer.

use crate::buffer::{Buffer, BufferError};
use std::fs;
use std::path::Path;

/// Ordered list of open buffers plus an active-tab pointer.
///
/// Invariant: `active` is `None` iff the buffer list is empty; otherwise it
/// is a valid index.
pub struct TabManager {
    buffers: Vec<Buffer>,
    active: Option<usize>,
}

impl TabManager {
    /// Create an empty tab manager.
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            active: None,
        }
    }

    /// Number of open tabs.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no tabs are open.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Index of the active tab, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The active buffer, if any.
    pub fn active_buffer(&self) -> Option<&Buffer> {
        self.active.and_then(|i| self.buffers.get(i))
    }

    /// Mutable access to the active buffer, if any.
    pub fn active_buffer_mut(&mut self) -> Option<&mut Buffer> {
        let index = self.active?;
        self.buffers.get_mut(index)
    }

    /// All open buffers in tab order.
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    /// Buffer at `index`, if in range.
    pub fn buffer(&self, index: usize) -> Option<&Buffer> {
        self.buffers.get(index)
    }

    /// Mutable buffer at `index`, if in range.
    pub fn buffer_mut(&mut self, index: usize) -> Option<&mut Buffer> {
        self.buffers.get_mut(index)
    }

    /// Find the tab holding the given absolute path.
    pub fn index_of_path(&self, path: &Path) -> Option<usize> {
        self.buffers
            .iter()
            .position(|b| !b.is_untitled() && b.path() == path)
    }

    /// Append an empty untitled buffer, activate it, and return its index.
    pub fn new_untitled(&mut self) -> usize {
        self.buffers.push(Buffer::new());
        let index = self.buffers.len() - 1;
        self.active = Some(index);
        index
    }

    /// Open a file, deduplicating by absolute path.
    ///
    /// If the path is already open, that tab is activated and returned;
    /// otherwise a new buffer is loaded and activated.
    pub fn open_file(&mut self, path: &Path) -> Result<usize, BufferError> {
        let abs = fs::canonicalize(path)?;
        if let Some(existing) = self.index_of_path(&abs) {
            self.active = Some(existing);
            return Ok(existing);
        }

        let buffer = Buffer::open(&abs)?;
        self.buffers.push(buffer);
        let index = self.buffers.len() - 1;
        self.active = Some(index);
        Ok(index)
    }

    /// Activate the tab at `index`. Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize) {
        if index < self.buffers.len() {
            self.active = Some(index);
        }
    }

    /// Close the tab at `index`, re-establishing the active-index invariant.
    ///
    /// Closing a tab before the active one shifts the active index down;
    /// closing the active tab clamps it to the new last valid index.
    pub fn close(&mut self, index: usize) {
        if index >= self.buffers.len() {
            return;
        }
        self.buffers.remove(index);

        if self.buffers.is_empty() {
            self.active = None;
            return;
        }

        if let Some(active) = self.active {
            let next = if index < active {
                active - 1
            } else {
                active.min(self.buffers.len() - 1)
            };
            self.active = Some(next);
        }
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}
