//! Text search with options.
//!
//! Plain substring queries are regex-escaped and compiled; regex mode passes
//! the pattern through. All results are non-overlapping half-open **byte**
//! ranges, scanned left-to-right.

use regex::RegexBuilder;
use std::ops::Range;

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

/// Search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provided regex pattern failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_whole_word(text: &str, m: &Range<usize>) -> bool {
    let before = text[..m.start].chars().next_back();
    let after = text[m.end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Find all non-overlapping matches of `query` in `text`.
///
/// An empty query yields no matches; empty regex matches are skipped.
pub fn find_all(
    text: &str,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<Range<usize>>, SearchError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };

    let re = RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()?;

    let mut matches = Vec::new();
    for m in re.find_iter(text) {
        if m.start() == m.end() {
            continue;
        }
        let range = m.start()..m.end();
        if options.whole_word && !is_whole_word(text, &range) {
            continue;
        }
        matches.push(range);
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_substring() {
        let matches = find_all("foo bar foo", "foo", SearchOptions::default()).unwrap();
        assert_eq!(matches, vec![0..3, 8..11]);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let matches = find_all("abc", "", SearchOptions::default()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_non_overlapping() {
        let matches = find_all("aaaa", "aa", SearchOptions::default()).unwrap();
        assert_eq!(matches, vec![0..2, 2..4]);
    }

    #[test]
    fn test_case_insensitive() {
        let options = SearchOptions {
            case_sensitive: false,
            ..Default::default()
        };
        let matches = find_all("Foo foo FOO", "foo", options).unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_whole_word() {
        let options = SearchOptions {
            whole_word: true,
            ..Default::default()
        };
        let matches = find_all("cat catalog cat", "cat", options).unwrap();
        assert_eq!(matches, vec![0..3, 12..15]);
    }

    #[test]
    fn test_regex_mode() {
        let options = SearchOptions {
            regex: true,
            ..Default::default()
        };
        let matches = find_all("a1 b22 c333", r"\d+", options).unwrap();
        assert_eq!(matches, vec![1..2, 4..6, 8..11]);
    }

    #[test]
    fn test_invalid_regex() {
        let options = SearchOptions {
            regex: true,
            ..Default::default()
        };
        assert!(find_all("x", "(", options).is_err());
    }

    #[test]
    fn test_plain_mode_escapes_metacharacters() {
        let matches = find_all("a.c abc", "a.c", SearchOptions::default()).unwrap();
        assert_eq!(matches, vec![0..3]);
    }
}
