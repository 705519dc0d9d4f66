//! Shared text helpers.
//!
//! Line splitting and char/byte offset mapping used across the kernel. The
//! editor's public coordinates are Unicode scalar values ("runes"); file and
//! edit-log offsets are bytes. `CharIndex` bridges the two for one snapshot
//! of a document.

/// Split `text` on `\n`, preserving a trailing empty line.
///
/// N newlines produce N+1 lines, matching the editor's line model.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Precomputed char-offset <-> byte-offset mapping for one text snapshot.
#[derive(Debug)]
pub struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    /// Build the index for `text`.
    pub fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    /// Total number of chars in the indexed text.
    pub fn char_count(&self) -> usize {
        self.char_to_byte.len().saturating_sub(1)
    }

    /// Convert a char offset to a byte offset, clamping past-the-end input.
    pub fn char_to_byte(&self, char_offset: usize) -> usize {
        let clamped = char_offset.min(self.char_count());
        self.char_to_byte
            .get(clamped)
            .copied()
            .unwrap_or(self.text_len)
    }

    /// Convert a byte offset to a char offset, clamping past-the-end input.
    ///
    /// A byte offset inside a multi-byte sequence maps to the following char.
    pub fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}
