//! Project file listing and cross-file search.
//!
//! Walks the workspace with gitignore-aware traversal, so build output and
//! vendored trees stay out of fuzzy-file lists and search results.

use ignore::WalkBuilder;
use mane_core::search::{SearchError, SearchOptions, find_all};
use mane_core::text::split_lines;
use std::path::{Path, PathBuf};

/// One match from a cross-file search, 0-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    /// File containing the match.
    pub path: PathBuf,
    /// Line (0-based).
    pub line: usize,
    /// Column in chars.
    pub col: usize,
    /// The full line containing the match.
    pub text: String,
}

/// List the project's files under `root`, honoring ignore rules.
///
/// Results are sorted for stable presentation.
pub fn list(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Search every project file for `query` as a literal substring.
///
/// Binary or unreadable files are skipped. One [`FileMatch`] per
/// occurrence, in path order then document order.
pub fn search_files(query: &str, root: &Path) -> Result<Vec<FileMatch>, SearchError> {
    let mut matches = Vec::new();
    if query.is_empty() {
        return Ok(matches);
    }

    for path in list(root) {
        let Ok(contents) = std::fs::read_to_string(&path) else {
            continue;
        };
        let ranges = find_all(&contents, query, SearchOptions::default())?;
        if ranges.is_empty() {
            continue;
        }

        let lines = split_lines(&contents);
        // Byte offset at which each line starts.
        let mut starts = Vec::with_capacity(lines.len());
        let mut acc = 0usize;
        for line in &lines {
            starts.push(acc);
            acc += line.len() + 1;
        }

        for range in ranges {
            let line = match starts.binary_search(&range.start) {
                Ok(i) => i,
                Err(i) => i - 1,
            };
            let col = contents[starts[line]..range.start].chars().count();
            matches.push(FileMatch {
                path: path.clone(),
                line,
                col,
                text: lines[line].to_string(),
            });
        }
    }
    Ok(matches)
}
