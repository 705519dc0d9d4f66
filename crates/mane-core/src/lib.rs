//! Core text-editing engine: buffers, tabs, cursors, and structural ops.
//!
//! This crate is the headless heart of the editor. It owns document text
//! and its edit history ([`buffer::Buffer`]), the open-file set
//! ([`tabs::TabManager`]), multi-cursor editing ([`cursor::MultiCursor`]),
//! rectangular selection ([`block::BlockSelection`]), code folding
//! ([`folding::FoldState`]), and pure structural transforms (indentation,
//! bracket matching, line operations, snippet expansion).
//!
//! Nothing here talks to a terminal, a process, or a language server; the
//! `mane-lsp` and `mane-editor` crates layer those concerns on top.
//!
//! Coordinate conventions: buffer edit records use byte offsets; cursors,
//! block columns, and snippet results use char offsets. [`line_index`]
//! converts between the two and to line/column positions.

#![warn(missing_docs)]

pub mod block;
pub mod buffer;
pub mod cursor;
pub mod folding;
pub mod line_index;
pub mod search;
pub mod snippet;
pub mod structural;
pub mod tabs;
pub mod text;

pub use block::BlockSelection;
pub use buffer::{Buffer, BufferError, EditRecord};
pub use cursor::{Cursor, MultiCursor};
pub use folding::{FoldRegion, FoldState, detect_fold_regions};
pub use line_index::LineIndex;
pub use search::{SearchError, SearchOptions, find_all};
pub use snippet::ExpandedSnippet;
pub use tabs::TabManager;
