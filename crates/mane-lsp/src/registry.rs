//! Language server registry: which command to run per language.
//!
//! Ships defaults for common languages; a project-level `.mane-lsp.json`
//! file at the workspace root can override or extend them:
//!
//! ```json
//! { "go": { "command": "gopls", "args": ["-remote=auto"] } }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// How to launch a language server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Executable name or path.
    pub command: String,
    /// Arguments passed to the executable.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ServerConfig {
    fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Maps language ids to server launch configurations.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    servers: HashMap<String, ServerConfig>,
}

impl ServerRegistry {
    /// Registry with the built-in defaults.
    pub fn with_defaults() -> Self {
        let mut servers = HashMap::new();
        servers.insert("go".into(), ServerConfig::new("gopls", &[]));
        servers.insert(
            "typescript".into(),
            ServerConfig::new("typescript-language-server", &["--stdio"]),
        );
        servers.insert(
            "javascript".into(),
            ServerConfig::new("typescript-language-server", &["--stdio"]),
        );
        servers.insert(
            "python".into(),
            ServerConfig::new("pyright-langserver", &["--stdio"]),
        );
        servers.insert("rust".into(), ServerConfig::new("rust-analyzer", &[]));
        servers.insert("c".into(), ServerConfig::new("clangd", &[]));
        servers.insert("cpp".into(), ServerConfig::new("clangd", &[]));
        servers.insert("java".into(), ServerConfig::new("jdtls", &[]));
        servers.insert("lua".into(), ServerConfig::new("lua-language-server", &[]));
        servers.insert(
            "json".into(),
            ServerConfig::new("vscode-json-language-server", &["--stdio"]),
        );
        Self { servers }
    }

    /// Load defaults, then apply `.mane-lsp.json` overrides from `root` if
    /// present. A malformed file is logged and ignored.
    pub fn load(root: &Path) -> Self {
        let mut registry = Self::with_defaults();
        let config_path = root.join(".mane-lsp.json");
        let Ok(contents) = std::fs::read_to_string(&config_path) else {
            return registry;
        };
        match serde_json::from_str::<HashMap<String, ServerConfig>>(&contents) {
            Ok(overrides) => registry.servers.extend(overrides),
            Err(err) => {
                log::warn!("ignoring malformed {}: {}", config_path.display(), err);
            }
        }
        registry
    }

    /// The launch configuration for `language`, if any.
    pub fn config_for(&self, language: &str) -> Option<&ServerConfig> {
        self.servers.get(language)
    }
}

/// LSP `languageId` for a file path, derived from its extension.
///
/// Returns `None` for unknown extensions; such files are edited without a
/// language server.
pub fn language_id_for_path(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "go" => Some("go"),
        "ts" | "tsx" | "mts" | "cts" => Some("typescript"),
        "js" | "jsx" | "mjs" | "cjs" => Some("javascript"),
        "py" | "pyi" => Some("python"),
        "rs" => Some("rust"),
        "c" | "h" => Some("c"),
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => Some("cpp"),
        "java" => Some("java"),
        "lua" => Some("lua"),
        "json" => Some("json"),
        _ => None,
    }
}
