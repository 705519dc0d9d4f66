//! Editor binding layer: tabs, cursors, folding, and LSP wired together.
//!
//! [`Editor`] is the one value a shell (terminal widget, web RPC server,
//! automation host) constructs and drives. It composes the text engine
//! from `mane-core` with the language-server coordinator from `mane-lsp`,
//! exposes the keystroke-level operations ([`editor`]), the embedding
//! contract for automation ([`embed`]), the closed command set
//! ([`commands`]), ignore-aware project search ([`project`]), and the
//! syntax provider seam ([`syntax`]).

#![warn(missing_docs)]

pub mod commands;
pub mod editor;
pub mod embed;
pub mod project;
pub mod syntax;

pub use commands::Command;
pub use editor::{EditSource, Editor, EditorError, ShellIntent};
pub use embed::SearchHit;
pub use project::FileMatch;
pub use syntax::{HeuristicSyntax, Symbol, SymbolKind, SyntaxProvider};
