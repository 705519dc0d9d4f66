//! LSP snippet expansion to plain text.
//!
//! Supports the placeholder forms `$N`, `${N:default}`, and the final
//! cursor marker `$0`. Expansion replaces each placeholder with its default
//! text (empty when absent) and reports where the cursor should land: the
//! lowest-numbered tab stop when any exists, otherwise the `$0` position,
//! otherwise the end of the expanded text.

/// Result of expanding a snippet template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedSnippet {
    /// The template with all placeholders substituted.
    pub text: String,
    /// Char offset where the cursor should be placed.
    pub cursor: usize,
}

/// Expand an LSP snippet template into plain text plus a cursor offset.
pub fn expand(template: &str) -> ExpandedSnippet {
    let mut out = String::new();
    let mut out_chars = 0usize;
    // (stop number, char offset in output)
    let mut stops: Vec<(u32, usize)> = Vec::new();
    let mut final_stop: Option<usize> = None;

    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            out_chars += 1;
            continue;
        }

        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut number = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        number.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }

                let mut default_text = String::new();
                match chars.peek() {
                    Some(':') => {
                        chars.next();
                        for c in chars.by_ref() {
                            if c == '}' {
                                break;
                            }
                            default_text.push(c);
                        }
                    }
                    Some('}') => {
                        chars.next();
                    }
                    _ => {}
                }

                match number.parse::<u32>() {
                    Ok(0) => final_stop = Some(out_chars),
                    Ok(n) => {
                        stops.push((n, out_chars));
                        out.push_str(&default_text);
                        out_chars += default_text.chars().count();
                    }
                    Err(_) => {
                        // Not a placeholder; keep the literal text.
                        out.push_str("${");
                        out.push_str(&default_text);
                        out_chars += 2 + default_text.chars().count();
                    }
                }
            }
            Some(c) if c.is_ascii_digit() => {
                let mut number = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        number.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match number.parse::<u32>() {
                    Ok(0) => final_stop = Some(out_chars),
                    Ok(n) => stops.push((n, out_chars)),
                    Err(_) => {}
                }
            }
            _ => {
                out.push('$');
                out_chars += 1;
            }
        }
    }

    let cursor = stops
        .iter()
        .min_by_key(|(n, _)| *n)
        .map(|&(_, pos)| pos)
        .or(final_stop)
        .unwrap_or(out_chars);

    ExpandedSnippet { text: out, cursor }
}
