//! Syntax provider seam.
//!
//! Fold regions, document symbols, and the debug syntax tree come from a
//! [`SyntaxProvider`]. The built-in [`HeuristicSyntax`] works from braces
//! and declaration keywords; an embedder with a real parser can supply its
//! own provider through `Editor::with_syntax`.

use mane_core::folding::{FoldRegion, detect_fold_regions};
use mane_core::text::split_lines;

/// Coarse symbol classification for outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A function or method.
    Function,
    /// A struct, class, or enum.
    Type,
    /// A module or namespace.
    Module,
    /// Anything else recognized.
    Other,
}

impl SymbolKind {
    /// Lowercase tag used in shell output and the syntax tree.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Type => "type",
            Self::Module => "module",
            Self::Other => "symbol",
        }
    }
}

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Declared name.
    pub name: String,
    /// Classification.
    pub kind: SymbolKind,
    /// Line the declaration starts on (0-based).
    pub start_line: usize,
    /// Last line of the declaration's body.
    pub end_line: usize,
}

/// Source of structure-derived data for a document.
pub trait SyntaxProvider {
    /// Foldable line ranges for `text`.
    fn fold_regions(&self, text: &str) -> Vec<FoldRegion> {
        detect_fold_regions(text)
    }

    /// Outline symbols for `text`.
    fn symbols(&self, text: &str) -> Vec<Symbol>;

    /// A debug s-expression describing the document structure.
    fn syntax_tree(&self, text: &str) -> String;
}

/// Keyword/brace heuristic provider, used when no parser is plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSyntax;

// Declaration keywords across the languages the registry knows about.
const DECLARATIONS: &[(&str, SymbolKind)] = &[
    ("fn ", SymbolKind::Function),
    ("pub fn ", SymbolKind::Function),
    ("func ", SymbolKind::Function),
    ("def ", SymbolKind::Function),
    ("function ", SymbolKind::Function),
    ("struct ", SymbolKind::Type),
    ("pub struct ", SymbolKind::Type),
    ("enum ", SymbolKind::Type),
    ("trait ", SymbolKind::Type),
    ("class ", SymbolKind::Type),
    ("interface ", SymbolKind::Type),
    ("mod ", SymbolKind::Module),
    ("module ", SymbolKind::Module),
    ("namespace ", SymbolKind::Module),
];

fn declaration_on(line: &str) -> Option<(String, SymbolKind)> {
    let trimmed = line.trim_start();
    for (keyword, kind) in DECLARATIONS {
        if let Some(rest) = trimmed.strip_prefix(keyword) {
            let name: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if !name.is_empty() {
                return Some((name, *kind));
            }
        }
    }
    None
}

impl SyntaxProvider for HeuristicSyntax {
    fn symbols(&self, text: &str) -> Vec<Symbol> {
        let regions = detect_fold_regions(text);
        split_lines(text)
            .iter()
            .enumerate()
            .filter_map(|(line_idx, line)| {
                let (name, kind) = declaration_on(line)?;
                // The body extends to the end of the fold region opened on
                // the declaration line, when there is one.
                let end_line = regions
                    .iter()
                    .find(|r| r.start_line == line_idx)
                    .map_or(line_idx, |r| r.end_line);
                Some(Symbol {
                    name,
                    kind,
                    start_line: line_idx,
                    end_line,
                })
            })
            .collect()
    }

    fn syntax_tree(&self, text: &str) -> String {
        let symbols = self.symbols(text);
        let mut out = String::from("(source_file");
        render_children(&symbols, 0, usize::MAX, &mut out);
        out.push(')');
        out
    }
}

// Render symbols nested by line containment, in document order.
fn render_children(symbols: &[Symbol], from_line: usize, to_line: usize, out: &mut String) {
    let mut line = from_line;
    for (i, symbol) in symbols.iter().enumerate() {
        if symbol.start_line < line || symbol.start_line > to_line {
            continue;
        }
        out.push_str(&format!(
            " ({} {} {}:{}",
            symbol.kind.tag(),
            symbol.name,
            symbol.start_line,
            symbol.end_line
        ));
        if symbol.end_line > symbol.start_line {
            render_children(
                &symbols[i + 1..],
                symbol.start_line + 1,
                symbol.end_line,
                out,
            );
        }
        out.push(')');
        line = symbol.end_line + 1;
    }
}
