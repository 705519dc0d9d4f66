//! Structural operations: indentation, bracket matching, line operations.
//!
//! All functions here are pure string transforms over `\n`-split lines or
//! char sequences; the editor binding decides when to invoke them and how
//! to record the resulting edits.

use crate::text::split_lines;

/// Detect the dominant indent unit of `text`.
///
/// Counts first-character tabs vs. spaces across non-empty lines. When
/// space-indented lines dominate, returns the minimum positive leading-space
/// run seen as a string of spaces; otherwise a single tab. Default: tab.
pub fn detect_indent_style(text: &str) -> String {
    let mut tab_lines = 0usize;
    let mut space_lines = 0usize;
    let mut min_spaces: Option<usize> = None;

    for line in split_lines(text) {
        match line.chars().next() {
            Some('\t') => tab_lines += 1,
            Some(' ') => {
                space_lines += 1;
                let run = line.chars().take_while(|&c| c == ' ').count();
                min_spaces = Some(min_spaces.map_or(run, |m| m.min(run)));
            }
            _ => {}
        }
    }

    if space_lines > tab_lines {
        " ".repeat(min_spaces.unwrap_or(4))
    } else {
        "\t".to_string()
    }
}

/// Compute the indentation for the line following `prev_line`.
///
/// Starts from `prev_line`'s whitespace prefix. If the last non-whitespace
/// char opens a block (`{`, `(`, `[`, `:`), one extra indent unit is
/// appended: a tab when the prefix already uses tabs or is empty, otherwise
/// four spaces, or for `:` a repeat of the current leading-space width.
pub fn compute_indent(prev_line: &str) -> String {
    let mut indent: String = prev_line
        .chars()
        .take_while(|&c| c == ' ' || c == '\t')
        .collect();

    let last = prev_line.trim_end().chars().next_back();
    if let Some(ch) = last
        && matches!(ch, '{' | '(' | '[' | ':')
    {
        if indent.is_empty() || indent.contains('\t') {
            indent.push('\t');
        } else if ch == ':' {
            let width = indent.len();
            indent.push_str(&" ".repeat(width));
        } else {
            indent.push_str("    ");
        }
    }

    indent
}

/// Find the position of the bracket matching the one at char `pos`.
///
/// Openers scan forward, closers scan backward, maintaining a depth
/// counter. Returns `None` when `pos` is not on a bracket or the text is
/// unbalanced.
pub fn find_matching_bracket(text: &str, pos: usize) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let &ch = chars.get(pos)?;

    let (open, close, forward) = match ch {
        '(' => ('(', ')', true),
        '[' => ('[', ']', true),
        '{' => ('{', '}', true),
        ')' => ('(', ')', false),
        ']' => ('[', ']', false),
        '}' => ('{', '}', false),
        _ => return None,
    };

    let mut depth = 0isize;
    if forward {
        for (i, &c) in chars.iter().enumerate().skip(pos) {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
    } else {
        for i in (0..=pos).rev() {
            let c = chars[i];
            if c == close {
                depth += 1;
            } else if c == open {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
    }

    None
}

/// Remove line `index` from `text`. Out-of-range indices are a no-op.
pub fn delete_line(text: &str, index: usize) -> String {
    let mut lines = split_lines(text);
    if index < lines.len() {
        lines.remove(index);
    }
    lines.join("\n")
}

/// Swap line `index` with its neighbor `delta` away (`-1` up, `1` down).
///
/// Out-of-bounds moves leave the text unchanged.
pub fn move_line(text: &str, index: usize, delta: isize) -> String {
    let mut lines = split_lines(text);
    let Some(target) = index.checked_add_signed(delta) else {
        return text.to_string();
    };
    if index < lines.len() && target < lines.len() {
        lines.swap(index, target);
    }
    lines.join("\n")
}

/// Insert a copy of line `index` immediately after it.
pub fn duplicate_line(text: &str, index: usize) -> String {
    let mut lines = split_lines(text);
    if index < lines.len() {
        lines.insert(index + 1, lines[index]);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_indent_spaces_dominate() {
        let text = "fn x() {\n    a\n    b\n  c\n}";
        assert_eq!(detect_indent_style(text), "  ");
    }

    #[test]
    fn test_detect_indent_tabs_default() {
        assert_eq!(detect_indent_style("a\nb"), "\t");
        assert_eq!(detect_indent_style("\ta\n  b\n\tc"), "\t");
    }

    #[test]
    fn test_compute_indent_copies_prefix() {
        assert_eq!(compute_indent("    let x = 1;"), "    ");
        assert_eq!(compute_indent("\t\treturn"), "\t\t");
        assert_eq!(compute_indent("plain"), "");
    }

    #[test]
    fn test_compute_indent_extends_after_opener() {
        assert_eq!(compute_indent("fn main() {"), "\t");
        assert_eq!(compute_indent("    if x {"), "        ");
        assert_eq!(compute_indent("\tfor y in z {"), "\t\t");
        assert_eq!(compute_indent("items = ["), "\t");
    }

    #[test]
    fn test_compute_indent_colon_doubles_space_width() {
        assert_eq!(compute_indent("  def f():"), "    ");
        assert_eq!(compute_indent("def f():"), "\t");
    }

    #[test]
    fn test_compute_indent_trailing_whitespace() {
        assert_eq!(compute_indent("x = {  "), "\t");
    }

    #[test]
    fn test_bracket_match_symmetry() {
        // Scenario: find_matching_bracket("((a))", 0) = 4 and back.
        assert_eq!(find_matching_bracket("((a))", 0), Some(4));
        assert_eq!(find_matching_bracket("((a))", 4), Some(0));
        assert_eq!(find_matching_bracket("((a))", 1), Some(3));
        assert_eq!(find_matching_bracket("((a))", 3), Some(1));
    }

    #[test]
    fn test_bracket_match_mixed_kinds() {
        let text = "{[()]}";
        assert_eq!(find_matching_bracket(text, 0), Some(5));
        assert_eq!(find_matching_bracket(text, 1), Some(4));
        assert_eq!(find_matching_bracket(text, 2), Some(3));
    }

    #[test]
    fn test_bracket_match_none() {
        assert_eq!(find_matching_bracket("abc", 1), None);
        assert_eq!(find_matching_bracket("(((", 0), None);
        assert_eq!(find_matching_bracket("", 0), None);
    }

    #[test]
    fn test_bracket_match_multibyte() {
        let text = "(你)";
        assert_eq!(find_matching_bracket(text, 0), Some(2));
        assert_eq!(find_matching_bracket(text, 2), Some(0));
    }

    #[test]
    fn test_delete_line() {
        assert_eq!(delete_line("a\nb\nc", 1), "a\nc");
        assert_eq!(delete_line("a\nb\nc", 9), "a\nb\nc");
    }

    #[test]
    fn test_move_line() {
        assert_eq!(move_line("a\nb\nc", 0, 1), "b\na\nc");
        assert_eq!(move_line("a\nb\nc", 2, -1), "a\nc\nb");
        assert_eq!(move_line("a\nb\nc", 0, -1), "a\nb\nc");
        assert_eq!(move_line("a\nb\nc", 2, 1), "a\nb\nc");
    }

    #[test]
    fn test_duplicate_line() {
        assert_eq!(duplicate_line("a\nb", 0), "a\na\nb");
        assert_eq!(duplicate_line("a\nb", 1), "a\nb\nb");
    }
}
