//! JSON-RPC/LSP client over child-process stdio.
//!
//! Runtime-agnostic: a writer thread drains an outbound channel into the
//! server's stdin, a reader thread parses framed messages from its stdout
//! into an inbound channel. The editor thread drives everything else.
//! Requests block the caller with a deadline and a cancel token; server
//! notifications are buffered and drained by [`LspClient::poll`].

use crate::error::LspError;
use crate::registry::ServerConfig;
use crate::transport::{read_message, write_message};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// How often a blocked request re-checks its cancel token and deadline.
const POLL_SLICE: Duration = Duration::from_millis(25);

/// Cooperative cancellation flag for in-flight requests.
///
/// Clones share the flag; any clone may cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
enum Inbound {
    Message(Value),
    IoError(String),
}

/// An LSP client bound to one spawned server process.
pub struct LspClient {
    child: Child,
    tx: mpsc::Sender<Value>,
    rx: mpsc::Receiver<Inbound>,
    // Messages that arrived while a request was blocking; drained by poll().
    buffered: VecDeque<Value>,
    next_id: u64,
    closed: bool,
}

impl LspClient {
    /// Spawn a language server and connect to its stdio.
    ///
    /// stderr is discarded so server logs cannot corrupt the editor's
    /// terminal.
    pub fn spawn(config: &ServerConfig, cwd: &Path) -> Result<Self, LspError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        let child = cmd.spawn()?;
        Self::from_child(child)
    }

    /// Connect to an already-spawned child whose stdio is piped.
    pub fn from_child(mut child: Child) -> Result<Self, LspError> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LspError::Io(io::Error::other("server stdin not piped")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LspError::Io(io::Error::other("server stdout not piped")))?;

        let (tx_out, rx_out) = mpsc::channel::<Value>();
        let (tx_in, rx_in) = mpsc::channel::<Inbound>();

        {
            let tx_in = tx_in.clone();
            thread::spawn(move || write_loop(stdin, rx_out, tx_in));
        }
        thread::spawn(move || read_loop(stdout, tx_in));

        Ok(Self {
            child,
            tx: tx_out,
            rx: rx_in,
            buffered: VecDeque::new(),
            next_id: 1,
            closed: false,
        })
    }

    /// Run the `initialize` handshake and send `initialized`.
    ///
    /// Advertises the capabilities the coordinator consumes: full-text
    /// document sync, snippet-aware completion, hover, definition,
    /// references, rename, code actions, and published diagnostics.
    pub fn initialize(&mut self, root_uri: &str, timeout: Duration) -> Result<Value, LspError> {
        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri,
            "workspaceFolders": [{"uri": root_uri, "name": "workspace"}],
            "capabilities": {
                "textDocument": {
                    "synchronization": {"didSave": true},
                    "completion": {"completionItem": {"snippetSupport": true}},
                    "hover": {"contentFormat": ["plaintext", "markdown"]},
                    "definition": {},
                    "references": {},
                    "rename": {},
                    "codeAction": {},
                    "publishDiagnostics": {}
                }
            }
        });
        let result = self.call("initialize", params, &CancelToken::new(), timeout)?;
        self.notify("initialized", json!({}))?;
        Ok(result)
    }

    /// Send a notification (no response expected).
    pub fn notify(&mut self, method: &str, params: Value) -> Result<(), LspError> {
        if self.closed {
            return Err(LspError::Closed);
        }
        self.send(json!({"jsonrpc": "2.0", "method": method, "params": params}))
    }

    /// Send a request and block until its response, cancellation, or the
    /// deadline.
    ///
    /// Messages that arrive for other ids are buffered for [`Self::poll`];
    /// server-to-client requests are answered inline with safe defaults so
    /// the server cannot deadlock us.
    pub fn call(
        &mut self,
        method: &str,
        params: Value,
        cancel: &CancelToken,
        timeout: Duration,
    ) -> Result<Value, LspError> {
        if self.closed {
            return Err(LspError::Closed);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))?;

        let deadline = Instant::now() + timeout;
        loop {
            if cancel.is_cancelled() {
                // The server is allowed to finish; a late response for this
                // id is simply never matched and gets buffered then ignored.
                return Err(LspError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(LspError::Timeout);
            }

            let msg = match self.rx.recv_timeout(POLL_SLICE) {
                Ok(Inbound::Message(msg)) => msg,
                Ok(Inbound::IoError(err)) => {
                    self.closed = true;
                    return Err(LspError::Protocol(err));
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.closed = true;
                    return Err(LspError::Closed);
                }
            };

            if msg.get("id").and_then(Value::as_u64) == Some(id) && msg.get("method").is_none() {
                return response_result(msg);
            }
            self.dispatch_or_buffer(msg)?;
        }
    }

    /// Drain buffered and newly arrived server notifications.
    ///
    /// Server-to-client requests are answered with defaults and not
    /// returned. Call this regularly from the editor loop.
    pub fn poll(&mut self) -> Result<Vec<Value>, LspError> {
        loop {
            match self.rx.try_recv() {
                Ok(Inbound::Message(msg)) => self.dispatch_or_buffer(msg)?,
                Ok(Inbound::IoError(err)) => {
                    self.closed = true;
                    return Err(LspError::Protocol(err));
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break,
            }
        }
        Ok(self.buffered.drain(..).collect())
    }

    /// Whether the connection has been shut down or has failed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shut the server down: `shutdown` request, `exit` notification, then
    /// reap the process. Idempotent; errors along the way are ignored since
    /// the process is going away regardless.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        let _ = self.call(
            "shutdown",
            Value::Null,
            &CancelToken::new(),
            Duration::from_millis(500),
        );
        let _ = self.notify("exit", Value::Null);
        self.closed = true;
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    fn send(&mut self, message: Value) -> Result<(), LspError> {
        self.tx.send(message).map_err(|_| {
            self.closed = true;
            LspError::Closed
        })
    }

    // Answer server->client requests with safe defaults; buffer everything
    // else (notifications) for poll().
    fn dispatch_or_buffer(&mut self, msg: Value) -> Result<(), LspError> {
        let is_server_request = msg.get("method").is_some() && msg.get("id").is_some();
        if !is_server_request {
            self.buffered.push_back(msg);
            return Ok(());
        }

        let id = msg.get("id").cloned().unwrap_or(Value::Null);
        let method = msg.get("method").and_then(Value::as_str).unwrap_or("");
        let result = match method {
            "workspace/configuration" => {
                let items = msg
                    .pointer("/params/items")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                Value::Array(vec![Value::Null; items])
            }
            "window/showMessageRequest" | "client/registerCapability" => Value::Null,
            "workspace/applyEdit" => json!({"applied": false}),
            _ => Value::Null,
        };
        self.send(json!({"jsonrpc": "2.0", "id": id, "result": result}))
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn response_result(mut msg: Value) -> Result<Value, LspError> {
    if let Some(error) = msg.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown server error")
            .to_string();
        return Err(LspError::Server { code, message });
    }
    match msg.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(LspError::Protocol("response missing result".into())),
    }
}

fn write_loop(stdin: std::process::ChildStdin, rx: mpsc::Receiver<Value>, tx_in: mpsc::Sender<Inbound>) {
    let mut writer = BufWriter::new(stdin);
    for msg in rx {
        if let Err(err) = write_message(&mut writer, &msg) {
            let _ = tx_in.send(Inbound::IoError(err.to_string()));
            break;
        }
    }
}

fn read_loop(stdout: std::process::ChildStdout, tx: mpsc::Sender<Inbound>) {
    let mut reader = BufReader::new(stdout);
    loop {
        match read_message(&mut reader) {
            Ok(Some(value)) => {
                if tx.send(Inbound::Message(value)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                let _ = tx.send(Inbound::IoError(err.to_string()));
                break;
            }
        }
    }
}
