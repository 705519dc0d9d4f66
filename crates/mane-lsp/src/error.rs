//! Error type shared across the LSP client and coordinator.

use std::io;
use thiserror::Error;

/// Errors surfaced by LSP transport, client, and coordinator operations.
#[derive(Debug, Error)]
pub enum LspError {
    /// Pipe or process I/O failure.
    #[error("lsp i/o error: {0}")]
    Io(#[from] io::Error),
    /// The peer sent something that is not valid JSON-RPC/LSP.
    #[error("lsp protocol error: {0}")]
    Protocol(String),
    /// The server answered a request with a JSON-RPC error object.
    #[error("lsp server error {code}: {message}")]
    Server {
        /// JSON-RPC error code.
        code: i64,
        /// Server-provided message.
        message: String,
    },
    /// The client connection has been shut down.
    #[error("lsp connection closed")]
    Closed,
    /// The caller cancelled the request via its cancel token.
    #[error("lsp request cancelled")]
    Cancelled,
    /// No response arrived within the request deadline.
    #[error("lsp request timed out")]
    Timeout,
    /// No server is available for the requested language.
    #[error("no language server available for {0}")]
    Unavailable(String),
}
