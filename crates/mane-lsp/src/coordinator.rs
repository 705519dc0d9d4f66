//! Document coordinator: keeps language servers in sync with open buffers.
//!
//! One coordinator serves one workspace root. It lazily spawns one server
//! per language on first open, mirrors buffer contents through
//! `didOpen`/`didChange`/`didSave`/`didClose` with full-text sync and a
//! monotonically increasing version per document, debounces change
//! notifications, and collects published diagnostics.
//!
//! The coordinator runs entirely on the editor thread; call
//! [`Coordinator::pump`] regularly to flush debounced changes and drain
//! server notifications.

use crate::client::{CancelToken, LspClient};
use crate::error::LspError;
use crate::position::{Position, Range, offset_to_position, position_to_offset, utf16_to_char};
use crate::registry::{ServerRegistry, language_id_for_path};
use crate::uri::{path_to_uri, uri_to_path};
use mane_core::LineIndex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Delay between the last keystroke and the `didChange` it produces.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// Default deadline for blocking requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Diagnostic severity, mirroring the protocol's 1..=4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A hard error.
    Error,
    /// A warning.
    Warning,
    /// Informational notice.
    Information,
    /// An editor hint.
    Hint,
}

impl Severity {
    fn from_lsp(value: Option<i64>) -> Self {
        match value {
            Some(2) => Self::Warning,
            Some(3) => Self::Information,
            Some(4) => Self::Hint,
            _ => Self::Error,
        }
    }
}

/// One published diagnostic, with char-based columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Start line (0-based).
    pub line: usize,
    /// Start column in chars.
    pub col: usize,
    /// End line (0-based).
    pub end_line: usize,
    /// End column in chars.
    pub end_col: usize,
    /// Severity; missing severities default to [`Severity::Error`].
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Producing tool, when reported.
    pub source: Option<String>,
}

/// A completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// Display label.
    pub label: String,
    /// Text to insert; falls back to the label when absent.
    pub insert_text: String,
    /// Whether `insert_text` is a snippet template.
    pub is_snippet: bool,
    /// Extra detail such as a type signature.
    pub detail: Option<String>,
}

/// A resolved source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File the location points into.
    pub path: PathBuf,
    /// Line (0-based).
    pub line: usize,
    /// Column in chars.
    pub col: usize,
}

/// A single text replacement within one file, char-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Start of the replaced span.
    pub start: (usize, usize),
    /// End of the replaced span (exclusive).
    pub end: (usize, usize),
    /// Replacement text.
    pub new_text: String,
}

/// Rename edits grouped per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdits {
    /// Target file.
    pub path: PathBuf,
    /// Edits within that file, in server order.
    pub edits: Vec<TextEdit>,
}

/// An available code action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    /// Action title shown to the user.
    pub title: String,
    /// Action kind such as `quickfix`, when reported.
    pub kind: Option<String>,
}

struct DocumentShadow {
    uri: String,
    language: String,
    version: u64,
    text: String,
}

enum ServerSlot {
    Ready(LspClient),
    // Spawn or initialize failed; never retried for this session.
    Failed,
}

struct PendingChange {
    path: PathBuf,
    text: String,
    deadline: Instant,
}

/// Synchronizes open documents with per-language servers.
pub struct Coordinator {
    root: PathBuf,
    registry: ServerRegistry,
    servers: HashMap<String, ServerSlot>,
    docs: HashMap<PathBuf, DocumentShadow>,
    diagnostics: HashMap<PathBuf, Vec<Diagnostic>>,
    pending: Option<PendingChange>,
    debounce: Duration,
    timeout: Duration,
}

impl Coordinator {
    /// Create a coordinator for the workspace at `root`.
    ///
    /// Reads `.mane-lsp.json` overrides from the root.
    pub fn new(root: PathBuf) -> Self {
        let registry = ServerRegistry::load(&root);
        Self {
            root,
            registry,
            servers: HashMap::new(),
            docs: HashMap::new(),
            diagnostics: HashMap::new(),
            pending: None,
            debounce: DEBOUNCE,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// The workspace root this coordinator serves.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Track `path` and announce it to its language server.
    ///
    /// Files without a recognized language, or whose server failed to
    /// start, are tracked locally but produce no traffic.
    pub fn open(&mut self, path: &Path, text: &str) {
        let Some(language) = language_id_for_path(path) else {
            return;
        };
        let uri = path_to_uri(path);
        self.docs.insert(
            path.to_path_buf(),
            DocumentShadow {
                uri: uri.clone(),
                language: language.to_string(),
                version: 1,
                text: text.to_string(),
            },
        );

        if let Some(client) = self.client_for(language) {
            let result = client.notify(
                "textDocument/didOpen",
                json!({"textDocument": {
                    "uri": uri,
                    "languageId": language,
                    "version": 1,
                    "text": text,
                }}),
            );
            if let Err(err) = result {
                log::warn!("didOpen failed for {}: {}", path.display(), err);
            }
        }
    }

    /// Record an edit to `path`; the `didChange` is sent after the debounce
    /// window, carrying only the latest text.
    pub fn change(&mut self, path: &Path, text: &str, now: Instant) {
        if !self.docs.contains_key(path) {
            return;
        }
        // Only one slot; switching documents flushes the old one first.
        if let Some(pending) = &self.pending
            && pending.path != path
        {
            self.flush_pending();
        }
        self.pending = Some(PendingChange {
            path: path.to_path_buf(),
            text: text.to_string(),
            deadline: now + self.debounce,
        });
    }

    /// Flush due debounced changes and drain server notifications.
    pub fn pump(&mut self, now: Instant) {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline)
        {
            self.flush_pending();
        }
        self.drain_notifications();
    }

    /// Announce a save of `path`. Any pending change for it is flushed
    /// first so the server never sees a save for stale content.
    pub fn save(&mut self, path: &Path) {
        if self.pending.as_ref().is_some_and(|p| p.path == path) {
            self.flush_pending();
        }
        let Some((uri, language)) = self.doc_identity(path) else {
            return;
        };
        if let Some(client) = self.client_for(&language) {
            let _ = client.notify("textDocument/didSave", json!({"textDocument": {"uri": uri}}));
        }
    }

    /// Stop tracking `path`: send `didClose`, drop its shadow and its
    /// diagnostics.
    pub fn close(&mut self, path: &Path) {
        if self.pending.as_ref().is_some_and(|p| p.path == path) {
            self.pending = None;
        }
        let Some(shadow) = self.docs.remove(path) else {
            return;
        };
        self.diagnostics.remove(path);
        if let Some(client) = self.client_for(&shadow.language) {
            let _ = client.notify(
                "textDocument/didClose",
                json!({"textDocument": {"uri": shadow.uri}}),
            );
        }
    }

    /// Current diagnostics for `path`, empty when none were published.
    pub fn diagnostics(&self, path: &Path) -> &[Diagnostic] {
        self.diagnostics.get(path).map_or(&[], Vec::as_slice)
    }

    /// Request completions at a char position in `path`.
    pub fn completion(
        &mut self,
        path: &Path,
        line: usize,
        col: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<CompletionItem>, LspError> {
        let result = self.request_at(path, line, col, "textDocument/completion", cancel)?;
        Ok(parse_completions(&result))
    }

    /// Request hover text at a char position in `path`.
    pub fn hover(
        &mut self,
        path: &Path,
        line: usize,
        col: usize,
        cancel: &CancelToken,
    ) -> Result<Option<String>, LspError> {
        let result = self.request_at(path, line, col, "textDocument/hover", cancel)?;
        Ok(parse_hover(&result))
    }

    /// Resolve the definition of the symbol at a char position.
    pub fn definition(
        &mut self,
        path: &Path,
        line: usize,
        col: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Location>, LspError> {
        let result = self.request_at(path, line, col, "textDocument/definition", cancel)?;
        Ok(self.parse_locations(&result))
    }

    /// Find references to the symbol at a char position.
    pub fn references(
        &mut self,
        path: &Path,
        line: usize,
        col: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Location>, LspError> {
        let (uri, language) = self.prepare_request(path)?;
        let position = self.lsp_position(path, line, col);
        let params = json!({
            "textDocument": {"uri": uri},
            "position": position,
            "context": {"includeDeclaration": true},
        });
        let timeout = self.timeout;
        let client = self.ready_client(&language)?;
        let result = client.call("textDocument/references", params, cancel, timeout)?;
        Ok(self.parse_locations(&result))
    }

    /// Rename the symbol at a char position across the workspace.
    pub fn rename(
        &mut self,
        path: &Path,
        line: usize,
        col: usize,
        new_name: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<FileEdits>, LspError> {
        let (uri, language) = self.prepare_request(path)?;
        let position = self.lsp_position(path, line, col);
        let params = json!({
            "textDocument": {"uri": uri},
            "position": position,
            "newName": new_name,
        });
        let timeout = self.timeout;
        let client = self.ready_client(&language)?;
        let result = client.call("textDocument/rename", params, cancel, timeout)?;
        Ok(self.parse_workspace_edit(&result))
    }

    /// List code actions for a char range in `path`.
    pub fn code_actions(
        &mut self,
        path: &Path,
        start: (usize, usize),
        end: (usize, usize),
        cancel: &CancelToken,
    ) -> Result<Vec<CodeAction>, LspError> {
        let (uri, language) = self.prepare_request(path)?;
        let range = Range::new(
            self.lsp_position(path, start.0, start.1),
            self.lsp_position(path, end.0, end.1),
        );
        let params = json!({
            "textDocument": {"uri": uri},
            "range": range,
            "context": {"diagnostics": []},
        });
        let timeout = self.timeout;
        let client = self.ready_client(&language)?;
        let result = client.call("textDocument/codeAction", params, cancel, timeout)?;
        Ok(parse_code_actions(&result))
    }

    /// Shut down every running server.
    pub fn shutdown(&mut self) {
        for slot in self.servers.values_mut() {
            if let ServerSlot::Ready(client) = slot {
                client.shutdown();
            }
        }
    }

    fn doc_identity(&self, path: &Path) -> Option<(String, String)> {
        self.docs
            .get(path)
            .map(|shadow| (shadow.uri.clone(), shadow.language.clone()))
    }

    fn flush_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(shadow) = self.docs.get_mut(&pending.path) else {
            return;
        };
        shadow.version += 1;
        shadow.text = pending.text;
        let uri = shadow.uri.clone();
        let version = shadow.version;
        let text = shadow.text.clone();
        let language = shadow.language.clone();

        if let Some(client) = self.client_for(&language) {
            let result = client.notify(
                "textDocument/didChange",
                json!({
                    "textDocument": {"uri": uri, "version": version},
                    "contentChanges": [{"text": text}],
                }),
            );
            if let Err(err) = result {
                log::warn!("didChange failed for {}: {}", pending.path.display(), err);
            }
        }
    }

    fn drain_notifications(&mut self) {
        let mut published: Vec<Value> = Vec::new();
        for slot in self.servers.values_mut() {
            let ServerSlot::Ready(client) = slot else {
                continue;
            };
            match client.poll() {
                Ok(messages) => {
                    published.extend(messages.into_iter().filter(|msg| {
                        msg.get("method").and_then(Value::as_str)
                            == Some("textDocument/publishDiagnostics")
                    }));
                }
                Err(err) => log::warn!("language server connection lost: {}", err),
            }
        }
        for msg in published {
            self.handle_publish_diagnostics(&msg);
        }
    }

    fn handle_publish_diagnostics(&mut self, msg: &Value) {
        let Some(uri) = msg.pointer("/params/uri").and_then(Value::as_str) else {
            return;
        };
        let Some(path) = uri_to_path(uri) else {
            return;
        };
        // Diagnostics for files we no longer hold open are dropped.
        let Some(shadow) = self.docs.get(&path) else {
            return;
        };
        let index = LineIndex::from_text(&shadow.text);

        let mut parsed = Vec::new();
        if let Some(items) = msg.pointer("/params/diagnostics").and_then(Value::as_array) {
            for item in items {
                if let Some(diag) = parse_diagnostic(item, &index) {
                    parsed.push(diag);
                }
            }
        }
        self.diagnostics.insert(path, parsed);
    }

    // Flush pending changes for `path` and return its (uri, language) so a
    // request never races its own edits.
    fn prepare_request(&mut self, path: &Path) -> Result<(String, String), LspError> {
        if self.pending.as_ref().is_some_and(|p| p.path == path) {
            self.flush_pending();
        }
        self.doc_identity(path)
            .ok_or_else(|| LspError::Unavailable(path.display().to_string()))
    }

    fn request_at(
        &mut self,
        path: &Path,
        line: usize,
        col: usize,
        method: &str,
        cancel: &CancelToken,
    ) -> Result<Value, LspError> {
        let (uri, language) = self.prepare_request(path)?;
        let position = self.lsp_position(path, line, col);
        let params = json!({"textDocument": {"uri": uri}, "position": position});
        let timeout = self.timeout;
        let client = self.ready_client(&language)?;
        client.call(method, params, cancel, timeout)
    }

    fn lsp_position(&self, path: &Path, line: usize, col: usize) -> Position {
        let Some(shadow) = self.docs.get(path) else {
            return Position::new(line as u32, col as u32);
        };
        let index = LineIndex::from_text(&shadow.text);
        let offset = index.position_to_char(line, col);
        offset_to_position(&index, offset)
    }

    fn client_for(&mut self, language: &str) -> Option<&mut LspClient> {
        if !self.servers.contains_key(language) {
            let slot = self.start_server(language);
            self.servers.insert(language.to_string(), slot);
        }
        match self.servers.get_mut(language) {
            Some(ServerSlot::Ready(client)) if !client.is_closed() => Some(client),
            _ => None,
        }
    }

    fn ready_client(&mut self, language: &str) -> Result<&mut LspClient, LspError> {
        let language = language.to_string();
        self.client_for(&language)
            .ok_or(LspError::Unavailable(language))
    }

    fn start_server(&mut self, language: &str) -> ServerSlot {
        let Some(config) = self.registry.config_for(language).cloned() else {
            log::info!("no language server configured for {language}");
            return ServerSlot::Failed;
        };
        let root_uri = path_to_uri(&self.root);
        match LspClient::spawn(&config, &self.root) {
            Ok(mut client) => match client.initialize(&root_uri, self.timeout) {
                Ok(_) => {
                    log::info!("language server ready for {language}: {}", config.command);
                    ServerSlot::Ready(client)
                }
                Err(err) => {
                    // Reported once; the slot stays failed for this session.
                    log::warn!("initialize failed for {language} ({}): {err}", config.command);
                    client.shutdown();
                    ServerSlot::Failed
                }
            },
            Err(err) => {
                log::warn!("failed to spawn {} for {language}: {err}", config.command);
                ServerSlot::Failed
            }
        }
    }

    fn parse_locations(&self, result: &Value) -> Vec<Location> {
        let raw: Vec<&Value> = match result {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![result],
            _ => Vec::new(),
        };

        let mut locations = Vec::new();
        for item in raw {
            let (uri, range) = if let Some(target) = item.get("targetUri") {
                (
                    target.as_str(),
                    item.get("targetSelectionRange")
                        .or_else(|| item.get("targetRange")),
                )
            } else {
                (
                    item.get("uri").and_then(Value::as_str),
                    item.get("range"),
                )
            };
            let (Some(uri), Some(range)) = (uri, range) else {
                continue;
            };
            let Some(path) = uri_to_path(uri) else {
                continue;
            };
            let Some(start) = range.get("start") else {
                continue;
            };
            let line = start.get("line").and_then(Value::as_u64).unwrap_or(0) as usize;
            let character = start.get("character").and_then(Value::as_u64).unwrap_or(0) as usize;
            let col = match self.docs.get(&path) {
                Some(shadow) => {
                    let index = LineIndex::from_text(&shadow.text);
                    utf16_to_char(&index.line_text(line).unwrap_or_default(), character)
                }
                // Unopened files: assume the line is ASCII until opened.
                None => character,
            };
            locations.push(Location { path, line, col });
        }
        locations
    }

    fn parse_workspace_edit(&self, result: &Value) -> Vec<FileEdits> {
        let mut files = Vec::new();

        let mut push_edits = |uri: &str, edits: &Value| {
            let Some(path) = uri_to_path(uri) else {
                return;
            };
            let index = self
                .docs
                .get(&path)
                .map(|shadow| LineIndex::from_text(&shadow.text));
            let Some(items) = edits.as_array() else {
                return;
            };
            let edits: Vec<TextEdit> = items
                .iter()
                .filter_map(|edit| parse_text_edit(edit, index.as_ref()))
                .collect();
            if !edits.is_empty() {
                files.push(FileEdits { path, edits });
            }
        };

        if let Some(changes) = result.get("changes").and_then(Value::as_object) {
            for (uri, edits) in changes {
                push_edits(uri, edits);
            }
        } else if let Some(doc_changes) = result.get("documentChanges").and_then(Value::as_array) {
            for change in doc_changes {
                if let Some(uri) = change.pointer("/textDocument/uri").and_then(Value::as_str)
                    && let Some(edits) = change.get("edits")
                {
                    push_edits(uri, edits);
                }
            }
        }
        files
    }

    #[cfg(test)]
    fn set_timing(&mut self, debounce: Duration, timeout: Duration) {
        self.debounce = debounce;
        self.timeout = timeout;
    }
}

fn lsp_pos_to_char(pos: &Value, index: Option<&LineIndex>) -> (usize, usize) {
    let line = pos.get("line").and_then(Value::as_u64).unwrap_or(0) as usize;
    let character = pos.get("character").and_then(Value::as_u64).unwrap_or(0) as usize;
    match index {
        Some(index) => {
            let offset = position_to_offset(
                index,
                Position::new(line as u32, character as u32),
            );
            index.char_to_position(offset)
        }
        None => (line, character),
    }
}

fn parse_text_edit(edit: &Value, index: Option<&LineIndex>) -> Option<TextEdit> {
    let range = edit.get("range")?;
    let new_text = edit.get("newText")?.as_str()?.to_string();
    Some(TextEdit {
        start: lsp_pos_to_char(range.get("start")?, index),
        end: lsp_pos_to_char(range.get("end")?, index),
        new_text,
    })
}

fn parse_diagnostic(item: &Value, index: &LineIndex) -> Option<Diagnostic> {
    let range = item.get("range")?;
    let (line, col) = lsp_pos_to_char(range.get("start")?, Some(index));
    let (end_line, end_col) = lsp_pos_to_char(range.get("end")?, Some(index));
    Some(Diagnostic {
        line,
        col,
        end_line,
        end_col,
        severity: Severity::from_lsp(item.get("severity").and_then(Value::as_i64)),
        message: item.get("message")?.as_str()?.to_string(),
        source: item
            .get("source")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn parse_completions(result: &Value) -> Vec<CompletionItem> {
    let items = match result {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => obj
            .get("items")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice),
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| {
            let label = item.get("label")?.as_str()?.to_string();
            let insert_text = item
                .get("insertText")
                .and_then(Value::as_str)
                .unwrap_or(&label)
                .to_string();
            // InsertTextFormat::Snippet == 2
            let is_snippet = item.get("insertTextFormat").and_then(Value::as_i64) == Some(2);
            let detail = item
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(CompletionItem {
                label,
                insert_text,
                is_snippet,
                detail,
            })
        })
        .collect()
}

fn parse_hover(result: &Value) -> Option<String> {
    let contents = result.get("contents")?;
    let text = match contents {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj.get("value")?.as_str()?.to_string(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get("value").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

fn parse_code_actions(result: &Value) -> Vec<CodeAction> {
    let Some(items) = result.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            Some(CodeAction {
                title: item.get("title")?.as_str()?.to_string(),
                kind: item
                    .get("kind")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::write_message;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    #[test]
    fn test_parse_completions_shapes() {
        let list = json!({"isIncomplete": false, "items": [
            {"label": "foo", "detail": "fn foo()"},
            {"label": "bar", "insertText": "bar($1)", "insertTextFormat": 2},
        ]});
        let items = parse_completions(&list);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].insert_text, "foo");
        assert!(!items[0].is_snippet);
        assert!(items[1].is_snippet);

        let bare = json!([{"label": "x"}]);
        assert_eq!(parse_completions(&bare).len(), 1);
        assert!(parse_completions(&Value::Null).is_empty());
    }

    #[test]
    fn test_parse_hover_shapes() {
        assert_eq!(
            parse_hover(&json!({"contents": "plain"})),
            Some("plain".to_string())
        );
        assert_eq!(
            parse_hover(&json!({"contents": {"kind": "markdown", "value": "**doc**"}})),
            Some("**doc**".to_string())
        );
        assert_eq!(
            parse_hover(&json!({"contents": ["a", {"value": "b"}]})),
            Some("a\nb".to_string())
        );
        assert_eq!(parse_hover(&Value::Null), None);
    }

    #[test]
    fn test_parse_code_actions() {
        let actions = parse_code_actions(&json!([
            {"title": "Fix it", "kind": "quickfix"},
            {"title": "Organize imports"},
        ]));
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind.as_deref(), Some("quickfix"));
        assert_eq!(actions[1].kind, None);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(Severity::from_lsp(Some(1)), Severity::Error);
        assert_eq!(Severity::from_lsp(Some(2)), Severity::Warning);
        assert_eq!(Severity::from_lsp(Some(4)), Severity::Hint);
        assert_eq!(Severity::from_lsp(None), Severity::Error);
    }

    // A fake server that answers `initialize` from a canned frame, then
    // copies everything it receives into `captured` for later inspection.
    fn scripted_root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        let response = root.join("init-response.bin");
        let mut file = std::fs::File::create(&response).unwrap();
        write_message(
            &mut file,
            &json!({"jsonrpc": "2.0", "id": 1, "result": {"capabilities": {}}}),
        )
        .unwrap();
        file.flush().unwrap();

        let captured = root.join("captured.bin");
        let script = format!(
            "cat {}; exec cat > {}",
            response.display(),
            captured.display()
        );
        let config = json!({
            "rust": {"command": "sh", "args": ["-c", script]}
        });
        std::fs::write(root.join(".mane-lsp.json"), config.to_string()).unwrap();
        (dir, captured)
    }

    fn captured_messages(captured: &Path, expect: usize) -> Vec<Value> {
        // The fake server writes asynchronously; wait for it to catch up.
        for _ in 0..100 {
            if let Ok(bytes) = std::fs::read(captured) {
                let mut reader = std::io::BufReader::new(bytes.as_slice());
                let mut messages = Vec::new();
                while let Ok(Some(msg)) = crate::transport::read_message(&mut reader) {
                    messages.push(msg);
                }
                if messages.len() >= expect {
                    return messages;
                }
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        panic!("fake server never received {expect} messages");
    }

    #[test]
    fn test_document_sync_versions_are_monotonic() {
        let (dir, captured) = scripted_root();
        let mut coordinator = Coordinator::new(dir.path().to_path_buf());
        coordinator.set_timing(Duration::from_millis(10), Duration::from_secs(5));

        let file = dir.path().join("main.rs");
        std::fs::write(&file, "fn main() {}").unwrap();

        coordinator.open(&file, "fn main() {}");

        let now = Instant::now();
        // Two quick edits inside one debounce window coalesce into one
        // didChange carrying the latest text.
        coordinator.change(&file, "fn main() { 1 }", now);
        coordinator.change(&file, "fn main() { 12 }", now);
        coordinator.pump(now + Duration::from_millis(50));

        coordinator.change(&file, "fn main() { 123 }", now);
        coordinator.pump(now + Duration::from_millis(100));

        coordinator.save(&file);
        coordinator.close(&file);

        // initialize request, initialized, didOpen, didChange x2, didSave,
        // didClose
        let messages = captured_messages(&captured, 7);
        let methods: Vec<&str> = messages
            .iter()
            .filter_map(|m| m.get("method").and_then(Value::as_str))
            .collect();
        assert_eq!(
            methods,
            vec![
                "initialize",
                "initialized",
                "textDocument/didOpen",
                "textDocument/didChange",
                "textDocument/didChange",
                "textDocument/didSave",
                "textDocument/didClose",
            ]
        );

        let versions: Vec<u64> = messages
            .iter()
            .filter(|m| m["method"] == "textDocument/didChange")
            .filter_map(|m| m.pointer("/params/textDocument/version").and_then(Value::as_u64))
            .collect();
        assert_eq!(versions, vec![2, 3]);

        let first_change = messages
            .iter()
            .find(|m| m["method"] == "textDocument/didChange")
            .unwrap();
        assert_eq!(
            first_change.pointer("/params/contentChanges/0/text"),
            Some(&json!("fn main() { 12 }"))
        );

        coordinator.shutdown();
    }

    #[test]
    fn test_unknown_language_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = Coordinator::new(dir.path().to_path_buf());
        let file = dir.path().join("notes.txt");
        coordinator.open(&file, "hello");
        coordinator.change(&file, "hello!", Instant::now());
        coordinator.pump(Instant::now());
        assert!(coordinator.diagnostics(&file).is_empty());
        let err = coordinator
            .hover(&file, 0, 0, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, LspError::Unavailable(_)));
    }

    #[test]
    fn test_failed_spawn_marks_server_failed() {
        let dir = tempfile::tempdir().unwrap();
        let config = json!({
            "rust": {"command": "/nonexistent/lsp-server", "args": []}
        });
        std::fs::write(dir.path().join(".mane-lsp.json"), config.to_string()).unwrap();

        let mut coordinator = Coordinator::new(dir.path().to_path_buf());
        let file = dir.path().join("lib.rs");
        coordinator.open(&file, "");
        // The document is still tracked locally.
        assert!(coordinator.diagnostics(&file).is_empty());
        let err = coordinator
            .definition(&file, 0, 0, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, LspError::Unavailable(_)));
    }

    #[test]
    fn test_publish_diagnostics_for_open_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = Coordinator::new(dir.path().to_path_buf());
        let file = dir.path().join("x.txt");
        // Track without a server by inserting the shadow directly through
        // open() of a known language is not possible for .txt, so exercise
        // the handler on its own.
        coordinator.docs.insert(
            file.clone(),
            DocumentShadow {
                uri: path_to_uri(&file),
                language: "rust".into(),
                version: 1,
                text: "let x = \u{1F600};".into(),
            },
        );

        let uri = path_to_uri(&file);
        let msg = json!({
            "jsonrpc": "2.0",
            "method": "textDocument/publishDiagnostics",
            "params": {
                "uri": uri,
                "diagnostics": [{
                    // Past the emoji: UTF-16 column 12 is char column 11.
                    "range": {
                        "start": {"line": 0, "character": 12},
                        "end": {"line": 0, "character": 13}
                    },
                    "severity": 2,
                    "message": "suspicious emoji",
                    "source": "demo"
                }]
            }
        });
        coordinator.handle_publish_diagnostics(&msg);

        let diags = coordinator.diagnostics(&file);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].col, 11);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].source.as_deref(), Some("demo"));

        // Closing drops stored diagnostics.
        coordinator.close(&file);
        assert!(coordinator.diagnostics(&file).is_empty());
    }

    #[test]
    fn test_diagnostics_for_unopened_uri_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = Coordinator::new(dir.path().to_path_buf());
        let msg = json!({
            "jsonrpc": "2.0",
            "method": "textDocument/publishDiagnostics",
            "params": {
                "uri": "file:///nowhere/gone.rs",
                "diagnostics": [{"range": {"start": {"line": 0, "character": 0},
                                            "end": {"line": 0, "character": 1}},
                                  "message": "stale"}]
            }
        });
        coordinator.handle_publish_diagnostics(&msg);
        assert!(coordinator.diagnostics(Path::new("/nowhere/gone.rs")).is_empty());
    }
}
