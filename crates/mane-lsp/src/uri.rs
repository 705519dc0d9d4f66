//! Path to `file://` URI conversion.

use std::fs;
use std::path::{Path, PathBuf};

/// Convert a local filesystem path to a `file://` URI.
///
/// Used when building `textDocument.uri` and `rootUri`. The path is
/// canonicalized when possible so the same file always yields the same URI.
pub fn path_to_uri(path: &Path) -> String {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let slashed = to_uri_slashes(&abs.to_string_lossy());
    format!("file://{}", percent_encode(&slashed))
}

/// Convert a `file://` URI back into a local filesystem path.
///
/// Intentionally minimal; round-trips URIs created by [`path_to_uri`] and
/// the URIs language servers echo back.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    let rest = rest.strip_prefix("localhost/").unwrap_or(rest);
    Some(PathBuf::from(from_uri_slashes(&percent_decode(rest))))
}

fn to_uri_slashes(path: &str) -> String {
    if !cfg!(windows) {
        return path.to_string();
    }
    let forward = path.replace('\\', "/");
    if forward.starts_with('/') {
        forward
    } else {
        format!("/{forward}")
    }
}

fn from_uri_slashes(path: &str) -> String {
    if !cfg!(windows) {
        return path.to_string();
    }
    // A drive-letter path carries no leading slash on windows.
    let trimmed = match path.as_bytes() {
        [b'/', drive, b':', ..] if drive.is_ascii_alphabetic() => &path[1..],
        _ => path,
    };
    trimmed.replace('/', "\\")
}

fn is_uri_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/')
}

fn percent_encode(path: &str) -> String {
    path.bytes()
        .fold(String::with_capacity(path.len()), |mut out, b| {
            if is_uri_safe(b) {
                out.push(char::from(b));
            } else {
                out.push_str(&format!("%{b:02X}"));
            }
            out
        })
}

// Malformed escapes pass through untouched rather than failing the whole
// URI.
fn percent_decode(encoded: &str) -> String {
    let mut bytes = encoded.bytes();
    let mut out = Vec::with_capacity(encoded.len());
    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        match (bytes.next(), bytes.next()) {
            (Some(hi), Some(lo)) => match hex_pair(hi, lo) {
                Some(decoded) => out.push(decoded),
                None => out.extend_from_slice(&[b'%', hi, lo]),
            },
            (Some(hi), None) => out.extend_from_slice(&[b'%', hi]),
            _ => out.push(b'%'),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = char::from(hi).to_digit(16)?;
    let lo = char::from(lo).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}
