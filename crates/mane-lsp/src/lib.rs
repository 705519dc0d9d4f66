//! Language Server Protocol plumbing for mane.
//!
//! Three layers, bottom to top:
//!
//! - [`transport`]: `Content-Length`-framed JSON-RPC over byte streams.
//! - [`client`]: one spawned server process with reader/writer threads,
//!   blocking requests with deadlines and cancel tokens, and buffered
//!   notifications.
//! - [`coordinator`]: document lifecycle (`didOpen`/`didChange`/`didSave`/
//!   `didClose`), debounced full-text sync, diagnostics, and typed request
//!   helpers, one lazily started server per language.
//!
//! All protocol coordinates (UTF-16 code units) are converted at this
//! crate's boundary by [`position`]; callers work in lines and chars.

#![warn(missing_docs)]

pub mod client;
pub mod coordinator;
pub mod error;
pub mod position;
pub mod registry;
pub mod transport;
pub mod uri;

pub use client::{CancelToken, LspClient};
pub use coordinator::{
    CodeAction, CompletionItem, Coordinator, Diagnostic, FileEdits, Location, Severity, TextEdit,
};
pub use error::LspError;
pub use registry::{ServerConfig, ServerRegistry, language_id_for_path};
